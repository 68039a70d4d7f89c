//! Multi-body rendering scenarios against the headless backend


use crate::foundation::math::Vec3;
use crate::render::backends::headless::HeadlessBackend;
use crate::render::body::{BodyTransform, RenderBody};
use crate::render::buffers::GpuBufferSet;
use crate::render::primitives::camera::Camera;
use crate::render::primitives::sphere::generate_sphere;
use crate::render::program::{ProgramBindings, ShaderProgram};
use crate::render::shaders::sphere_shader_source;
use crate::render::texture::Texture;

/// Backend, linked program and the two-body scene used by the scenarios
pub(crate) struct Fixture {
    pub backend: HeadlessBackend,
    pub program: ShaderProgram,
    pub camera: Camera,
    pub bodies: Vec<RenderBody>,
}

pub(crate) fn primary_transform() -> BodyTransform {
    BodyTransform::new(Vec3::new(0.0, 0.0, -2500.0), Vec3::new(1.0, 1.0, 0.0), 1.0, 0.0, 1.0)
        .expect("valid primary transform")
}

pub(crate) fn secondary_transform() -> BodyTransform {
    BodyTransform::relative_to(&primary_transform(), Vec3::new(-1500.0, 500.0, -2500.0), 0.75, 0.5)
        .expect("valid secondary transform")
}

pub(crate) fn fixture() -> Fixture {
    let mut backend = HeadlessBackend::new(800, 600);
    let program = ShaderProgram::link(&mut backend, &sphere_shader_source(), &ProgramBindings::default())
        .expect("built-in program links");

    let primary_mesh = generate_sphere(640.0, 8).expect("valid sphere");
    let secondary_mesh = generate_sphere(640.0, 6).expect("valid sphere");

    let primary = RenderBody::new(
        "primary",
        GpuBufferSet::upload(&mut backend, &primary_mesh).expect("upload"),
        Texture::placeholder(&mut backend).expect("texture"),
        primary_transform(),
    );
    let secondary = RenderBody::new(
        "secondary",
        GpuBufferSet::upload(&mut backend, &secondary_mesh).expect("upload"),
        Texture::placeholder(&mut backend).expect("texture"),
        secondary_transform(),
    );

    backend.clear_log();
    Fixture {
        backend,
        program,
        camera: Camera::default(),
        bodies: vec![primary, secondary],
    }
}
