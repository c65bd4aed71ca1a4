use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use drape::deform::{Deformer, Node};
use drape::rbf::RbfData;
use drape::{BakeConfig, BridgePreset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod io;

#[derive(Parser)]
#[command(name = "drape-bake")]
#[command(about = "Fits a garment mesh to a body using a pre-solved RBF displacement field", long_about = None)]
struct Cli {
    /// RBF field data (JSON)
    #[arg(long)]
    rbf: PathBuf,

    /// Garment mesh (OBJ)
    #[arg(long)]
    mesh: PathBuf,

    /// Where to write the deformed mesh (OBJ)
    #[arg(long)]
    out: PathBuf,

    /// Morph targets authored on the garment (JSON)
    #[arg(long)]
    source_morphs: Option<PathBuf>,

    /// Where to write the resulting morph targets (JSON)
    #[arg(long)]
    morphs: Option<PathBuf>,

    /// Bake settings (TOML). Flags below override file values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    bridge: Option<Bridge>,

    /// Vertices per parallel task
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Upper bound on working-buffer bytes
    #[arg(long)]
    memory_budget: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Bridge {
    BlenderToUnity,
    SwapYz,
    Identity,
}

impl From<Bridge> for BridgePreset {
    fn from(bridge: Bridge) -> Self {
        match bridge {
            Bridge::BlenderToUnity => BridgePreset::BlenderToUnity,
            Bridge::SwapYz => BridgePreset::SwapYz,
            Bridge::Identity => BridgePreset::Identity,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(?config, "bake settings");

    let data = RbfData::from_json_file(&cli.rbf).with_context(|| format!("loading {}", cli.rbf.display()))?;
    let mut mesh = io::load_obj(&cli.mesh)?;
    if let Some(path) = &cli.source_morphs {
        mesh.morph_targets = io::load_morphs(path)?;
    }
    info!(mesh = %mesh.name, vertices = mesh.vertex_count(), morph_targets = mesh.morph_targets.len(), "loaded garment");

    let mut deformer = Deformer::from_data(&data, config)?;
    let mut root = Node::new(0, mesh.name.clone()).with_mesh(Arc::new(mesh));
    let report = match deformer.bake(&root) {
        Ok(report) => report,
        Err(err) => {
            deformer.dispose();
            return Err(err.into());
        }
    };
    println!("{}", report);

    deformer.apply(&mut root);
    let ledger = deformer.close();
    debug!(live_buffers = ledger.live_buffers(), "deformer closed");

    if let Some(deformed) = root.renderer.as_ref().and_then(|r| r.mesh.as_ref()) {
        io::write_obj(&cli.out, deformed)?;
        info!(path = %cli.out.display(), "wrote deformed mesh");
        if let Some(path) = &cli.morphs {
            io::write_morphs(path, &deformed.morph_targets)?;
            info!(path = %path.display(), targets = deformed.morph_targets.len(), "wrote morph targets");
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<BakeConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => BakeConfig::default(),
    };
    if let Some(bridge) = cli.bridge {
        config.bridge = bridge.into();
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if cli.memory_budget.is_some() {
        config.memory_budget = cli.memory_budget;
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<BakeConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
