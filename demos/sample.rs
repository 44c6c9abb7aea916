use canvasrend::{
    color::Color,
    config::RendererConfig,
    extra::{camera_looking_at, create_transform, project_vertex, RecordingSurface},
    light::{Light, LightKind},
    material::*,
    texture::{Image, Texture},
    Matrix4, RenderData, RenderableFace, RenderableLine, RenderableSprite, Renderer, Vector2,
    Vector3, Vector4,
};
use nalgebra as na;

const CONFIG: &str = r#"{
    "pixel_ratio": 1.0,
    "clear_color": [0.05, 0.05, 0.1]
}"#;

fn main() -> anyhow::Result<()> {
    let config = RendererConfig::from_json(CONFIG)?;
    let mut renderer = Renderer::with_config(RecordingSurface::new(320, 180), config);

    let camera = camera_looking_at(
        Vector3::new(2.0, 2.0, 4.0),
        Vector3::zeros(),
        Vector3::y(),
        0.1,
        100.0,
    );
    let projection = Matrix4::new_perspective(16.0 / 9.0, 1.0, camera.near, camera.far);

    let mut data = RenderData::default();

    let lambert = data.add_material(MaterialKind::Lambert(MeshMaterial {
        color: Color::new(0.8, 0.4, 0.2),
        ..Default::default()
    }));
    let checker = {
        #[rustfmt::skip]
        let pixels: [u8; 16] = [
            255, 255, 255, 255,   0, 0, 0, 255,
            0, 0, 0, 255,   255, 255, 255, 255,
        ];
        let mut texture = Texture::new(Image::new(2, 2, &pixels[..]));
        texture.wrap_s = canvasrend::texture::Wrapping::Repeat;
        texture.wrap_t = canvasrend::texture::Wrapping::Repeat;
        texture.repeat = Vector2::new(4.0, 4.0);
        data.add_material(
            Material::new(MaterialKind::Basic(MeshMaterial {
                map: Some(texture),
                ..Default::default()
            }))
            .with_overdraw(0.5),
        )
    };
    let line = data.add_material(MaterialKind::LineDashed(Default::default()));
    let sprite = data.add_material(MaterialKind::SpriteBitmap(SpriteMaterial {
        color: Color::new(1.0, 1.0, 0.5),
        lights: true,
        ..Default::default()
    }));

    data.lights
        .push(Light::new(LightKind::Ambient, Color::new(0.2, 0.2, 0.2)));
    data.lights.push(
        Light::new(LightKind::Directional, Color::new(1.0, 1.0, 1.0))
            .with_position(Vector3::new(1.0, 3.0, 2.0))
            .with_intensity(0.8),
    );

    let mut angle = 0.0f32;

    for frame in 0..2 {
        let model = create_transform(
            Vector3::zeros(),
            na::UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let corner = |x: f32, z: f32| {
            let p = model.transform_point(&na::Point3::new(x, 0.0, z)).coords;
            project_vertex(&projection, &camera, p)
        };

        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );

        data.elements.clear();

        // Floor quad, back half textured, front half lit.
        let mut back = RenderableFace::new(a, d, b, checker);
        back.uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 0.0),
        ];
        data.push(back);
        data.push(RenderableFace::new(b, d, c, lambert));
        data.push(RenderableLine::new(a, c, line));

        let top = project_vertex(&projection, &camera, Vector3::new(0.0, 1.0, 0.0));
        data.push(RenderableSprite::new(
            Vector4::new(
                top.position_screen.x,
                top.position_screen.y,
                top.position_screen.z,
                1.0,
            ),
            Vector2::new(0.1, 0.1),
            sprite,
        ));

        let info = renderer.render(&mut data, &(), &camera)?;
        let commands = renderer.surface_mut().take_commands();

        println!(
            "frame {frame}: {} faces, {} commands",
            info.faces,
            commands.len()
        );
        println!("{}", serde_json::to_string_pretty(&commands)?);

        angle += 0.3;
    }

    Ok(())
}
