use kiss3d::camera::Camera;
use kiss3d::context::Context;
use kiss3d::light::Light;
use kiss3d::resource::{Effect, Material, Mesh, ShaderAttribute, ShaderUniform};
use kiss3d::scene::ObjectData;
use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector3};

/// Texture times color, with no lighting at all. kiss3d's default material
/// divides everything by three and leans on a diffuse term, which leaves a
/// body lit from its own center at a third of its brightness.
pub struct UnlitMaterial {
    shader: Effect,
    position: ShaderAttribute<Point3<f32>>,
    tex_coord: ShaderAttribute<Point2<f32>>,
    color: ShaderUniform<Point3<f32>>,
    transform: ShaderUniform<Matrix4<f32>>,
    scale: ShaderUniform<Matrix3<f32>>,
    proj: ShaderUniform<Matrix4<f32>>,
    view: ShaderUniform<Matrix4<f32>>,
}

impl UnlitMaterial {
    /// Needs a live GL context. `None` if the shader doesn't expose what we
    /// expect of it.
    pub fn new() -> Option<Self> {
        let mut shader = Effect::new_from_str(VERTEX_SRC, FRAGMENT_SRC);

        shader.use_program();

        Some(UnlitMaterial {
            position: shader.get_attrib("position")?,
            tex_coord: shader.get_attrib("tex_coord")?,
            color: shader.get_uniform("color")?,
            transform: shader.get_uniform("transform")?,
            scale: shader.get_uniform("scale")?,
            proj: shader.get_uniform("proj")?,
            view: shader.get_uniform("view")?,
            shader,
        })
    }
}

impl Material for UnlitMaterial {
    fn render(
        &mut self,
        pass: usize,
        transform: &Isometry3<f32>,
        scale: &Vector3<f32>,
        camera: &mut dyn Camera,
        _: &Light,
        data: &ObjectData,
        mesh: &mut Mesh,
    ) {
        if !data.surface_rendering_active() {
            return;
        }

        let ctxt = Context::get();
        if data.backface_culling_enabled() {
            ctxt.enable(Context::CULL_FACE);
        } else {
            ctxt.disable(Context::CULL_FACE);
        }

        self.shader.use_program();
        self.position.enable();
        self.tex_coord.enable();

        camera.upload(pass, &mut self.proj, &mut self.view);

        let scale = Matrix3::from_diagonal(scale);
        self.transform.upload(&transform.to_homogeneous());
        self.scale.upload(&scale);
        self.color.upload(data.color());

        mesh.bind_coords(&mut self.position);
        mesh.bind_uvs(&mut self.tex_coord);
        mesh.bind_faces();

        ctxt.active_texture(Context::TEXTURE0);
        ctxt.bind_texture(Context::TEXTURE_2D, Some(&**data.texture()));

        let _ = ctxt.polygon_mode(Context::FRONT_AND_BACK, Context::FILL);
        ctxt.draw_elements(
            Context::TRIANGLES,
            mesh.num_pts() as i32,
            Context::UNSIGNED_SHORT,
            0,
        );

        mesh.unbind();

        self.position.disable();
        self.tex_coord.disable();
    }
}

static VERTEX_SRC: &str = "#version 100
    attribute vec3 position;
    attribute vec2 tex_coord;
    uniform   mat3 scale;
    uniform   mat4 proj, view, transform;
    varying   vec2 tex_coord_v;

    void main() {
        gl_Position = proj * view * transform * vec4(scale * position, 1.0);
        tex_coord_v = tex_coord;
    }";

static FRAGMENT_SRC: &str = "#version 100
#ifdef GL_FRAGMENT_PRECISION_HIGH
   precision highp float;
#else
   precision mediump float;
#endif

    varying vec2 tex_coord_v;
    uniform vec3 color;
    uniform sampler2D tex;

    void main() {
        gl_FragColor = texture2D(tex, tex_coord_v) * vec4(color, 1.0);
    }";
