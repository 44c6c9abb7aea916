//! Per element drawing routines.
//!
//! All coordinates arriving here are already in centered pixel space. Each routine applies the
//! material's opacity and blending, builds the element's path, and paints it according to the
//! material kind. `elem_box` is grown by whatever the routine paints outside the raw geometry.

use crate::{
    color::{Color, Rgba},
    damage::Box2,
    light::accumulate_lights,
    material::{Material, MaterialKind, MeshMaterial, SpriteMaterial, VertexColors, Wireframe},
    surface::{LinearGradient, RasterSurface, Style},
    texture::Mapping,
    Frame, RenderableFace, RenderableLine, RenderableSprite, Renderer, Vector2,
};

fn smoothstep(x: f32, min: f32, max: f32) -> f32 {
    if x <= min {
        return 0.0;
    }
    if x >= max {
        return 1.0;
    }
    let x = (x - min) / (max - min);
    x * x * (3.0 - 2.0 * x)
}

impl<S: RasterSurface> Renderer<S> {
    fn apply_material(&mut self, material: &Material) {
        self.state.set_opacity(&mut self.surface, material.opacity);
        self.state.set_blending(&mut self.surface, material.blending);
    }

    pub(crate) fn render_sprite(
        &mut self,
        anchor: Vector2,
        sprite: &RenderableSprite,
        material: &Material,
        elem_box: &mut Box2,
    ) {
        self.apply_material(material);

        let scale = Vector2::new(
            sprite.scale.x * self.half_width,
            sprite.scale.y * self.half_height,
        );

        // Half diagonal, so that the box holds the sprite at any rotation.
        let dist = 0.5 * scale.magnitude();
        *elem_box = Box2::new(anchor.add_scalar(-dist), anchor.add_scalar(dist));

        match &material.kind {
            MaterialKind::SpriteBitmap(m) => self.render_sprite_bitmap(anchor, scale, m),
            MaterialKind::SpriteProgram(p) => {
                let style = Style::Color(Rgba::opaque(p.color));
                self.state.set_stroke_style(&mut self.surface, style);
                self.state.set_fill_style(&mut self.surface, style);

                let s = &mut self.surface;
                s.save();
                s.translate(anchor.x, anchor.y);
                if p.rotation != 0.0 {
                    s.rotate(p.rotation);
                }
                s.scale(scale.x, scale.y);

                (p.program)(s);

                s.restore();
            }
            MaterialKind::Basic(_)
            | MaterialKind::Lambert(_)
            | MaterialKind::Phong(_)
            | MaterialKind::Depth(_)
            | MaterialKind::Normal(_)
            | MaterialKind::LineBasic(_)
            | MaterialKind::LineDashed(_) => {}
        }
    }

    fn render_sprite_bitmap(&mut self, anchor: Vector2, scale: Vector2, m: &SpriteMaterial) {
        let textured = m
            .map
            .as_ref()
            .and_then(|t| t.loaded_image().map(|image| (t, image)));

        if let Some((texture, image)) = textured {
            let style = self
                .patterns
                .pattern(&mut self.surface, texture)
                .map_or(Style::Color(Rgba::BLACK), Style::Pattern);
            self.state.set_fill_style(&mut self.surface, style);

            let (w, h) = (image.width() as f32, image.height() as f32);
            let offset = Vector2::new(w * texture.offset.x, h * texture.offset.y);
            let size = Vector2::new(w * texture.repeat.x, h * texture.repeat.y);

            let s = &mut self.surface;
            s.save();
            s.translate(anchor.x, anchor.y);
            if m.rotation != 0.0 {
                s.rotate(m.rotation);
            }
            s.translate(-scale.x / 2.0, -scale.y / 2.0);
            s.scale(scale.x / size.x, scale.y / size.y);
            s.translate(-offset.x, -offset.y);
            s.fill_rect(offset.x, offset.y, size.x, size.y);
            s.restore();
        } else {
            let color = if m.lights {
                m.color.component_mul(&self.lights.total())
            } else {
                m.color
            };
            self.state
                .set_fill_style(&mut self.surface, Style::Color(Rgba::opaque(color)));

            let s = &mut self.surface;
            s.save();
            s.translate(anchor.x, anchor.y);
            if m.rotation != 0.0 {
                s.rotate(m.rotation);
            }
            s.scale(scale.x, -scale.y);
            s.fill_rect(-0.5, -0.5, 1.0, 1.0);
            s.restore();
        }
    }

    pub(crate) fn render_line(
        &mut self,
        v: &[Vector2; 2],
        line: &RenderableLine,
        material: &Material,
        elem_box: &mut Box2,
    ) {
        self.apply_material(material);

        self.surface.begin_path();
        self.surface.move_to(v[0].x, v[0].y);
        self.surface.line_to(v[1].x, v[1].y);

        match &material.kind {
            MaterialKind::LineBasic(m) => {
                self.state.set_line_width(&mut self.surface, m.width);
                self.state.set_line_cap(&mut self.surface, m.cap);
                self.state.set_line_join(&mut self.surface, m.join);

                let style = if m.vertex_colors == VertexColors::Vertex {
                    let [c1, c2] = line.vertex_colors.map(Rgba::opaque);
                    if c1 == c2 {
                        Style::Color(c1)
                    } else {
                        Style::LinearGradient(LinearGradient {
                            start: v[0],
                            end: v[1],
                            start_color: c1,
                            end_color: c2,
                        })
                    }
                } else {
                    Style::Color(Rgba::opaque(m.color))
                };
                self.state.set_stroke_style(&mut self.surface, style);

                self.surface.stroke();
                elem_box.expand_by_scalar(m.width * 2.0);
            }
            MaterialKind::LineDashed(m) => {
                self.state.set_line_width(&mut self.surface, m.line.width);
                self.state.set_line_cap(&mut self.surface, m.line.cap);
                self.state.set_line_join(&mut self.surface, m.line.join);
                self.state
                    .set_stroke_style(&mut self.surface, Style::Color(Rgba::opaque(m.line.color)));
                self.state
                    .set_line_dash(&mut self.surface, &[m.dash_size, m.gap_size]);

                self.surface.stroke();
                elem_box.expand_by_scalar(m.line.width * 2.0);

                self.state.set_line_dash(&mut self.surface, &[]);
            }
            MaterialKind::Basic(_)
            | MaterialKind::Lambert(_)
            | MaterialKind::Phong(_)
            | MaterialKind::Depth(_)
            | MaterialKind::Normal(_)
            | MaterialKind::SpriteBitmap(_)
            | MaterialKind::SpriteProgram(_) => {}
        }
    }

    pub(crate) fn render_face(
        &mut self,
        frame: &Frame<'_>,
        v: &[Vector2; 3],
        face: &RenderableFace,
        material: &Material,
        elem_box: &mut Box2,
    ) {
        self.info.vertices += 3;
        self.info.faces += 1;

        self.apply_material(material);

        let s = &mut self.surface;
        s.begin_path();
        s.move_to(v[0].x, v[0].y);
        s.line_to(v[1].x, v[1].y);
        s.line_to(v[2].x, v[2].y);
        s.close_path();

        match &material.kind {
            MaterialKind::Lambert(m) | MaterialKind::Phong(m) if m.map.is_none() => {
                let mut diffuse = m.color;
                if m.vertex_colors == VertexColors::Face {
                    diffuse.component_mul_assign(&face.color);
                }

                let centroid = (face.v1.position_world
                    + face.v2.position_world
                    + face.v3.position_world)
                    / 3.0;

                let mut color = self.lights.ambient;
                accumulate_lights(frame.lights, &centroid, &face.normal_model, &mut color);

                let color = color.component_mul(&diffuse) + m.emissive;
                self.paint_face(color, &m.wireframe, elem_box);
            }
            MaterialKind::Basic(m) | MaterialKind::Lambert(m) | MaterialKind::Phong(m) => {
                self.render_mesh(frame, v, face, m, elem_box)
            }
            MaterialKind::Depth(wireframe) => {
                let p = &face.v1.position_screen;
                let gray = 1.0 - smoothstep(p.z * p.w, frame.near, frame.far);
                self.paint_face(Color::repeat(gray), wireframe, elem_box);
            }
            MaterialKind::Normal(wireframe) => {
                let n = frame.normal_matrix * face.normal_model;
                let color = (n * 0.5).add_scalar(0.5);
                self.paint_face(color, wireframe, elem_box);
            }
            MaterialKind::SpriteBitmap(_)
            | MaterialKind::SpriteProgram(_)
            | MaterialKind::LineBasic(_)
            | MaterialKind::LineDashed(_) => {
                self.paint_face(Color::repeat(1.0), &Wireframe::default(), elem_box);
            }
        }
    }

    /// Textured, environment mapped or flat colored unlit face.
    fn render_mesh(
        &mut self,
        frame: &Frame<'_>,
        v: &[Vector2; 3],
        face: &RenderableFace,
        m: &MeshMaterial,
        elem_box: &mut Box2,
    ) {
        if let Some(map) = &m.map {
            if map.mapping == Mapping::Uv {
                self.patterns
                    .fill_triangle(&mut self.surface, &mut self.state, v, &face.uvs, map);
            }
        } else if let Some(env_map) = &m.env_map {
            if env_map.mapping == Mapping::SphericalReflection {
                let uvs = face.vertex_normals_model.map(|n| {
                    let n = frame.normal_matrix * n;
                    Vector2::new(0.5 * n.x + 0.5, 0.5 * n.y + 0.5)
                });
                self.patterns
                    .fill_triangle(&mut self.surface, &mut self.state, v, &uvs, env_map);
            }
        } else {
            let mut color = m.color;
            if m.vertex_colors == VertexColors::Face {
                color.component_mul_assign(&face.color);
            }
            self.paint_face(color, &m.wireframe, elem_box);
        }
    }

    /// Fills or outlines the current path.
    fn paint_face(&mut self, color: Color, wireframe: &Wireframe, elem_box: &mut Box2) {
        let style = Style::Color(Rgba::opaque(color));

        if wireframe.enabled {
            self.state.set_line_width(&mut self.surface, wireframe.width);
            self.state.set_line_cap(&mut self.surface, wireframe.cap);
            self.state.set_line_join(&mut self.surface, wireframe.join);
            self.state.set_stroke_style(&mut self.surface, style);

            self.surface.stroke();

            elem_box.expand_by_scalar(wireframe.width * 2.0);
        } else {
            self.state.set_fill_style(&mut self.surface, style);
            self.surface.fill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::smoothstep;

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 0.0);
        assert_eq!(smoothstep(3.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(1.5, 1.0, 2.0), 0.5);
    }
}
