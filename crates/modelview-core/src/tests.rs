use crate::bounds::*;
use crate::constants::*;
use crate::normalize::*;
use crate::scene::*;
use approx::assert_abs_diff_eq;
use glam::{Quat, Vec3};

fn assert_canonical(bounds: &Aabb) {
    let size = bounds.size();
    let center = bounds.center();
    assert_abs_diff_eq!(size.max_element(), CANONICAL_EXTENT, epsilon = 1e-5);
    assert_abs_diff_eq!(center.x, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(center.y, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(center.z, 0.0, epsilon = 1e-5);
}

#[test]
fn test_normalize_fits_longest_axis() {
    let boxes = [
        Aabb::new(Vec3::ZERO, Vec3::ONE),
        Aabb::new(Vec3::new(-3.0, 0.5, 10.0), Vec3::new(7.0, 1.0, 12.0)),
        Aabb::new(Vec3::new(10.0, 20.0, 30.0), Vec3::new(10.5, 20.25, 30.125)),
        Aabb::new(Vec3::new(-0.001, -0.002, 0.0), Vec3::new(0.001, 0.002, 0.0005)),
        // Flat in one axis is still a positive extent
        Aabb::new(Vec3::new(-4.0, 0.0, -1.0), Vec3::new(4.0, 0.0, 1.0)),
    ];

    for bounds in boxes {
        let fit = normalize(&bounds);
        assert!(fit.uniform_scale > 0.0);

        let fitted = Aabb::new(fit.apply(bounds.min), fit.apply(bounds.max));
        assert_canonical(&fitted);
    }
}

#[test]
fn test_normalize_scale_formula() {
    let bounds = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(5.0, 3.0, 4.0));
    let fit = normalize(&bounds);

    // Longest axis is x with 4 units
    assert_abs_diff_eq!(fit.uniform_scale, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(fit.center_offset.x, -1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(fit.center_offset.y, -1.25, epsilon = 1e-6);
    assert_abs_diff_eq!(fit.center_offset.z, -1.75, epsilon = 1e-6);
}

#[test]
fn test_normalize_degenerate_point() {
    let p = Vec3::new(3.0, -2.0, 1.0);
    let fit = normalize(&Aabb::new(p, p));

    assert_eq!(fit.uniform_scale, DEGENERATE_SCALE);
    assert_eq!(fit.center_offset, -p);
    assert_eq!(fit.apply(p), Vec3::ZERO);
}

#[test]
fn test_normalize_subnormal_extent_falls_back() {
    // 2 / 1e-45 overflows f32
    let bounds = Aabb::new(Vec3::ZERO, Vec3::new(1e-45, 0.0, 0.0));
    let fit = normalize(&bounds);

    assert_eq!(fit.uniform_scale, DEGENERATE_SCALE);
    assert!(fit.center_offset.is_finite());
}

#[test]
fn test_normalize_empty_box() {
    let fit = normalize(&Aabb::EMPTY);
    assert_eq!(fit, NormalizedTransform::IDENTITY);
}

#[test]
fn test_empty_box_properties() {
    assert!(Aabb::EMPTY.is_empty());
    assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
    assert_eq!(Aabb::EMPTY.center(), Vec3::ZERO);

    let mut b = Aabb::EMPTY;
    b.include_point(Vec3::ONE);
    assert!(!b.is_empty());
    assert_eq!(b.min, Vec3::ONE);
    assert_eq!(b.max, Vec3::ONE);
}

#[test]
fn test_transformed_bounds_rotation() {
    let cube = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let m = glam::Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
    let rotated = cube.transformed(&m);

    // A rotated unit cube grows to the diagonal along x and z
    let half_diag = 2.0_f32.sqrt();
    assert_abs_diff_eq!(rotated.max.x, half_diag, epsilon = 1e-5);
    assert_abs_diff_eq!(rotated.max.z, half_diag, epsilon = 1e-5);
    assert_abs_diff_eq!(rotated.max.y, 1.0, epsilon = 1e-5);
}

fn sample_scene() -> SceneNode {
    let leg = Aabb::new(Vec3::new(-0.1, 0.0, -0.1), Vec3::new(0.1, 0.8, 0.1));
    let seat = Aabb::new(Vec3::new(-1.0, 0.0, -0.5), Vec3::new(1.0, 0.2, 0.5));

    SceneNode::group("sofa")
        .with_child(
            SceneNode::mesh("seat", seat)
                .with_transform(NodeTransform::from_translation(Vec3::new(0.0, 0.8, 0.0))),
        )
        .with_child(
            SceneNode::group("legs")
                .with_transform(NodeTransform {
                    translation: Vec3::new(10.0, 0.0, 0.0),
                    rotation: Quat::IDENTITY,
                    scale: Vec3::splat(2.0),
                })
                .with_child(SceneNode::mesh("leg-a", leg))
                .with_child(
                    SceneNode::mesh("leg-b", leg)
                        .with_transform(NodeTransform::from_translation(Vec3::new(0.5, 0.0, 0.0))),
                ),
        )
}

#[test]
fn test_local_bounds_applies_child_transforms() {
    let scene = sample_scene();
    let bounds = scene.local_bounds();

    assert_abs_diff_eq!(bounds.min.x, -1.0, epsilon = 1e-5);
    // leg-b: (0.5 + 0.1) * 2 + 10
    assert_abs_diff_eq!(bounds.max.x, 11.2, epsilon = 1e-5);
    assert_abs_diff_eq!(bounds.max.y, 1.6, epsilon = 1e-5);
}

#[test]
fn test_prepare_for_display_normalizes_root() {
    let mut scene = sample_scene();
    let fit = prepare_for_display(&mut scene);

    assert_eq!(scene.transform.scale, Vec3::splat(fit.uniform_scale));
    assert_eq!(scene.transform.translation, fit.center_offset);
    assert_canonical(&scene.bounds());
}

#[test]
fn test_prepare_for_display_replaces_root_transform() {
    let mut scene = sample_scene().with_transform(NodeTransform {
        translation: Vec3::new(50.0, 50.0, 50.0),
        rotation: Quat::from_rotation_z(1.0),
        scale: Vec3::splat(7.0),
    });
    prepare_for_display(&mut scene);

    assert_eq!(scene.transform.rotation, Quat::IDENTITY);
    assert_canonical(&scene.bounds());
}

#[test]
fn test_prepare_for_display_enables_shadows() {
    let mut scene = sample_scene();
    prepare_for_display(&mut scene);

    let mut meshes = 0;
    scene.traverse(&mut |node: &SceneNode| {
        if let Some(mesh) = &node.mesh {
            meshes += 1;
            assert!(mesh.shadowed(), "mesh {:?} not shadowed", node.name);
        }
    });
    assert_eq!(meshes, 3);
    assert_eq!(scene.mesh_count(), 3);
    assert_eq!(scene.node_count(), 5);
}

#[test]
fn test_prepare_for_display_without_geometry() {
    let mut scene = SceneNode::group("empty");
    let fit = prepare_for_display(&mut scene);

    assert_eq!(fit.uniform_scale, DEGENERATE_SCALE);
    assert_eq!(scene.transform, NodeTransform::IDENTITY);
}
