use drape::math::*;
use drape::rbf::*;
use drape::{BakeError, BridgePreset};

macro_rules! assert_vec3_near {
    ($left:expr, $right:expr, $tol:expr $(,)?) => {{
        let l: Vec3 = $left;
        let r: Vec3 = $right;
        let tol: f64 = $tol;
        if (l.x - r.x).abs() > tol || (l.y - r.y).abs() > tol || (l.z - r.z).abs() > tol {
            panic!("assertion failed: left != right within tol={}\n  left: {:?}\n right: {:?}", tol, l, r);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_points() -> Vec<Vec3> {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let t = i as f64 * 0.37 - 0.8;
                let s = j as f64 * 0.29 - 0.6;
                points.push(Vec3::new(t, s, t * s + 0.1));
            }
        }
        points
    }

    fn authored_field() -> RbfField {
        RbfField::new(
            0.7,
            vec![Vec3::new(0.1, 0.2, 0.3), Vec3::new(-0.4, 0.5, 1.2), Vec3::new(0.9, -0.3, 0.0)],
            vec![Vec3::new(0.05, -0.02, 0.01), Vec3::new(-0.03, 0.04, 0.02), Vec3::new(0.0, 0.01, -0.06)],
            [
                Vec3::new(0.01, 0.02, 0.03),
                Vec3::new(0.1, 0.2, 0.3),
                Vec3::new(-0.4, 0.5, -0.6),
                Vec3::new(0.7, -0.8, 0.9),
            ],
        )
        .unwrap()
    }

    #[rstest]
    fn empty_field_is_identity(#[values(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1e3, 5e2, 0.25))] p: Vec3) {
        assert_eq!(RbfField::identity().evaluate(p), Vec3::ZERO);
        let from_rows = RbfField::from_rows("empty", 0.0, &[], &[], &[[0.0; 3]; 4]).unwrap();
        assert_eq!(from_rows.evaluate(p), Vec3::ZERO);
    }

    #[rstest]
    #[case(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0))]
    #[case(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0f64.sqrt(), 0.0))]
    #[case(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0f64.sqrt(), 0.0))]
    #[case(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 10.0f64.sqrt(), 0.0))]
    fn single_center_multiquadric(#[case] p: Vec3, #[case] expected: Vec3) {
        let field = RbfField::new(1.0, vec![Vec3::ZERO], vec![Vec3::new(0.0, 1.0, 0.0)], [Vec3::ZERO; 4]).unwrap();
        assert_vec3_near!(field.evaluate(p), expected, 1e-12);
    }

    #[test]
    fn polynomial_term() {
        let field = RbfField::from_rows("poly", 1.0, &[], &[], &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 2.0], [3.0, 0.0, 0.0]])
            .unwrap();
        // bias + x * Cx + y * Cy + z * Cz
        assert_vec3_near!(field.evaluate(Vec3::new(2.0, 0.5, -1.0)), Vec3::new(-2.0, 2.0, 1.0), 1e-12);
    }

    #[rstest]
    #[case(Vec3::new(0.5, 0.5, 0.5), true)]
    #[case(Vec3::new(0.0, 0.0, 0.0), true)] // boundary counts as inside
    #[case(Vec3::new(1.0, 1.0, 1.0), true)]
    #[case(Vec3::new(1.01, 0.5, 0.5), false)]
    #[case(Vec3::new(0.5, -0.01, 0.5), false)]
    #[case(Vec3::new(0.5, 0.5, 7.0), false)]
    fn bounds_masking(#[case] p: Vec3, #[case] inside: bool) {
        let field = authored_field();
        let bounded = BoundedField::new(field.clone(), Some(AABB::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0))));
        if inside {
            assert_eq!(bounded.evaluate(p), field.evaluate(p));
        } else {
            assert_eq!(bounded.evaluate(p), Vec3::ZERO);
        }
    }

    #[rstest]
    fn coordinate_round_trip(#[values(BridgePreset::BlenderToUnity, BridgePreset::SwapYz, BridgePreset::Identity)] preset: BridgePreset) {
        let bridge = CoordinateBridge::from_preset(preset);
        let field = authored_field();
        let converted = bridge.convert_field(&field);
        for p in sample_points() {
            let expected = bridge.convert(field.evaluate(p));
            assert_vec3_near!(converted.evaluate(bridge.convert(p)), expected, 1e-12);
        }
    }

    #[test]
    fn coordinate_round_trip_for_rotated_basis() {
        let rotation = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 0.83).to_mat33();
        let bridge = CoordinateBridge::from_basis(rotation).unwrap();
        let field = authored_field();
        let converted = bridge.convert_field(&field);
        for p in sample_points() {
            assert_vec3_near!(converted.evaluate(bridge.convert(p)), bridge.convert(field.evaluate(p)), 1e-10);
        }
    }

    #[test]
    fn bounded_round_trip_keeps_mask() {
        let bridge = CoordinateBridge::blender_to_unity();
        let bounded = BoundedField::new(authored_field(), Some(AABB::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5))));
        let converted = bridge.convert_bounded(&bounded);
        for p in sample_points() {
            assert_vec3_near!(converted.evaluate(bridge.convert(p)), bridge.convert(bounded.evaluate(p)), 1e-12);
        }
    }

    #[test]
    fn field_set_from_json() {
        let json = r#"{
            "epsilon": 1.0,
            "centers": [[0.0, 0.0, 0.0]],
            "weights": [[0.0, 1.0, 0.0]],
            "poly_weights": [[0,0,0],[0,0,0],[0,0,0],[0,0,0]],
            "shape_keys": [
                {"name": "Belly", "weight": 100, "epsilon": 1.0, "centers": [], "weights": [],
                 "poly_weights": [[0,0,1],[0,0,0],[0,0,0],[0,0,0]]},
                {"name": "Belly", "weight": 50, "epsilon": 1.0, "centers": [], "weights": [],
                 "poly_weights": [[0,0,1],[0,0,0],[0,0,0],[0,0,0]],
                 "bounds_min": [-1, -1, -1], "bounds_max": [1, 1, 1]},
                {"name": "Chest", "epsilon": 0.5, "centers": [], "weights": [],
                 "poly_weights": [[0,0,0],[0,0,0],[0,0,0],[0,0,0]]}
            ]
        }"#;
        let data = RbfData::from_json_str(json).unwrap();
        let set = FieldSet::from_data(&data, &CoordinateBridge::identity()).unwrap();
        assert_eq!(set.primary.len(), 1);
        assert_eq!(set.shape_keys.len(), 2);

        let belly = &set.shape_keys[0];
        assert_eq!(belly.name, "Belly");
        assert_eq!(belly.steps.iter().map(|s| s.weight).collect::<Vec<_>>(), vec![50.0, 100.0]);
        assert!(belly.steps[0].field.bounds.is_some());
        assert!(belly.steps[1].field.bounds.is_none());
        // missing weight defaults to 100
        assert_eq!(set.shape_keys[1].steps[0].weight, 100.0);
    }

    #[rstest]
    #[case(vec![[1.0, 0.0, 0.0]], vec![], vec![[0.0; 3]; 4])]
    #[case(vec![], vec![[1.0, 0.0, 0.0]], vec![[0.0; 3]; 4])]
    #[case(vec![], vec![], vec![[0.0; 3]; 3])]
    #[case(vec![], vec![], vec![[0.0; 3]; 5])]
    fn malformed_primary_field(#[case] centers: Vec<[f64; 3]>, #[case] weights: Vec<[f64; 3]>, #[case] poly: Vec<[f64; 3]>) {
        let data = RbfData { epsilon: 1.0, centers, weights, poly_weights: poly, shape_keys: None };
        let err = FieldSet::from_data(&data, &CoordinateBridge::default()).unwrap_err();
        assert!(matches!(err, BakeError::MalformedField { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn truncated_json_is_an_error() {
        let err = RbfData::from_json_str(r#"{"epsilon": 1.0, "centers": ["#).unwrap_err();
        assert!(matches!(err, BakeError::Json(_)));
        assert!(!err.is_fatal());
    }
}
