#[allow(unused_imports)]
use log::{debug, error, info, warn};

use crate::{
    mesh, mip_levels_for, render_cube_faces, shader, CaptureTarget, Context, Error, FaceViews,
    ImageLoader, PendingImage, PrecomputeConfig, Shader, Stage, Texture, TextureKind, VertexArray,
    PREFILTER_LEVELS, RG16F, RGBA16F,
};

/// A finished output texture as seen by the renderer.
#[derive(Clone, Debug)]
pub struct TextureInfo<'a, C: Context> {
    pub handle: &'a C::Texture,
    pub kind: TextureKind,
    pub cols: usize,
    pub rows: usize,
    pub levels: usize,
}

impl<'a, C: Context> TextureInfo<'a, C> {
    fn of<F>(texture: &'a Texture<C, F>) -> Option<Self> {
        Some(Self {
            handle: texture.handle()?,
            kind: texture.kind(),
            cols: texture.cols(),
            rows: texture.rows(),
            levels: texture.levels(),
        })
    }
}

/// Returns the face size and roughness rendered into a prefiltered mip.
pub fn prefilter_mip(base_size: usize, mip: usize, levels: usize) -> (usize, f32) {
    assert!(mip < levels, "mip level out of range");

    let size = (base_size as f32 * 0.5f32.powi(mip as i32)).round() as usize;

    let roughness = if levels > 1 {
        mip as f32 / (levels - 1) as f32
    } else {
        0.0
    };

    (size.max(1), roughness)
}

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Converts an equirectangular radiance image into image-based lighting
/// textures, one stage per call to [`Precompute::update`].
pub struct Precompute<C: Context> {
    gl: C,
    config: PrecomputeConfig,
    loader: Box<dyn ImageLoader>,

    stage: Stage,
    failure: Option<Error>,
    views: FaceViews,

    rad2env_shader: Shader<C>,
    env2irr_shader: Shader<C>,
    env2fil_shader: Shader<C>,
    brdf_shader: Shader<C>,

    unit_cube: VertexArray<C>,
    unit_quad: VertexArray<C>,

    capture: CaptureTarget<C>,
    pending_image: Option<PendingImage>,
    radiance_map: Option<Texture<C, RGBA16F>>,

    environment_map: Texture<C, RGBA16F>,
    irradiance_map: Texture<C, RGBA16F>,
    prefiltered_map: Texture<C, RGBA16F>,
    brdf_lut: Texture<C, RG16F>,
}

impl<C: Context> Precompute<C> {
    /// Starts building the pipeline programs and meshes.
    pub fn new(
        gl: C,
        config: PrecomputeConfig,
        loader: Box<dyn ImageLoader>,
    ) -> Result<Self, Error> {
        config.validate()?;

        if !gl.has_extension("EXT_color_buffer_float") {
            return Err(Error::MissingExtension("EXT_color_buffer_float"));
        }

        let mut rad2env_shader = Shader::new(gl.clone(), &shader::VS_UNIT_CUBE, &shader::FS_RAD2ENV);
        let mut env2irr_shader = Shader::new(gl.clone(), &shader::VS_UNIT_CUBE, &shader::FS_ENV2IRR);
        let mut env2fil_shader = Shader::new(gl.clone(), &shader::VS_UNIT_CUBE, &shader::FS_ENV2FIL);
        let mut brdf_shader = Shader::new(gl.clone(), &shader::VS_BRDF, &shader::FS_BRDF);

        env2irr_shader.set_define(
            "SAMPLE_DELTA",
            format!("{:.6}", config.irradiance_sample_delta),
        );
        env2fil_shader.set_define("SAMPLE_COUNT", config.prefilter_samples);
        brdf_shader.set_define("SAMPLE_COUNT", config.brdf_samples);

        let mut unit_cube = VertexArray::new(gl.clone());
        let mut unit_quad = VertexArray::new(gl.clone());

        let mut prepare = || -> Result<(), Error> {
            rad2env_shader.rebuild()?;
            env2irr_shader.rebuild()?;
            env2fil_shader.rebuild()?;
            brdf_shader.rebuild()?;

            unit_cube.upload(&mesh::unit_cube())?;
            unit_quad.upload(&mesh::unit_quad())
        };

        prepare().map_err(|error| error.in_stage(Stage::PreparingResources))?;

        info!("precompute pipeline created");

        Ok(Self {
            capture: CaptureTarget::new(gl.clone()),
            environment_map: Texture::new(gl.clone()),
            irradiance_map: Texture::new(gl.clone()),
            prefiltered_map: Texture::new(gl.clone()),
            brdf_lut: Texture::new(gl.clone()),
            gl,
            config,
            loader,
            stage: Stage::PreparingResources,
            failure: None,
            views: FaceViews::new(),
            rad2env_shader,
            env2irr_shader,
            env2fil_shader,
            brdf_shader,
            unit_cube,
            unit_quad,
            pending_image: None,
            radiance_map: None,
        })
    }

    pub fn config(&self) -> &PrecomputeConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_ready(&self) -> bool {
        self.stage.is_finished()
    }

    /// Assigns the radiance image and starts loading it.
    ///
    /// A pipeline converts a single image; later assignments are rejected.
    pub fn set_image(&mut self, url: &str) -> Result<(), Error> {
        if self.stage != Stage::PreparingResources {
            return Err(Error::ImageAlreadyAssigned);
        }

        info!("loading radiance image `{}'", url);

        self.pending_image = Some(self.loader.load(url));
        self.stage = Stage::LoadingRadianceSource;

        Ok(())
    }

    /// Runs the current stage if its prerequisites are ready.
    ///
    /// Returns `Ok(true)` when a stage completed during this call. Once a
    /// stage fails, the same error is returned on every further call.
    pub fn update(&mut self) -> Result<bool, Error> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        match self.advance() {
            Ok(advanced) => Ok(advanced),
            Err(error) => {
                let error = error.in_stage(self.stage);

                error!("{}", error);
                self.failure = Some(error.clone());

                Err(error)
            }
        }
    }

    pub fn environment_map(&self) -> Option<TextureInfo<C>> {
        self.output(&self.environment_map)
    }

    pub fn irradiance_map(&self) -> Option<TextureInfo<C>> {
        self.output(&self.irradiance_map)
    }

    pub fn prefiltered_map(&self) -> Option<TextureInfo<C>> {
        self.output(&self.prefiltered_map)
    }

    pub fn brdf_lut(&self) -> Option<TextureInfo<C>> {
        self.output(&self.brdf_lut)
    }

    fn output<'a, F>(&self, texture: &'a Texture<C, F>) -> Option<TextureInfo<'a, C>> {
        if self.is_ready() {
            TextureInfo::of(texture)
        } else {
            None
        }
    }

    fn advance(&mut self) -> Result<bool, Error> {
        match self.stage {
            Stage::PreparingResources | Stage::Finished => Ok(false),
            Stage::LoadingRadianceSource => {
                if !self.poll_radiance_map()? || !self.rad2env_shader.poll()? {
                    return Ok(false);
                }

                let radiance_map = match self.radiance_map.take() {
                    Some(radiance_map) => radiance_map,
                    None => return Ok(false),
                };

                self.stage = Stage::ConvertingToEnvironmentMap;
                self.convert_to_environment_map(&radiance_map)?;
                self.stage = Stage::CalculatingIrradianceMap;

                Ok(true)
            }
            Stage::ConvertingToEnvironmentMap => {
                unreachable!("environment conversion completes within a single update")
            }
            Stage::CalculatingIrradianceMap => {
                if !self.env2irr_shader.poll()? {
                    return Ok(false);
                }

                self.calculate_irradiance_map()?;
                self.stage = Stage::CalculatingPrefilteredMap;

                Ok(true)
            }
            Stage::CalculatingPrefilteredMap => {
                if !self.env2fil_shader.poll()? {
                    return Ok(false);
                }

                self.calculate_prefiltered_map()?;
                self.stage = Stage::GeneratingBrdfLut;

                Ok(true)
            }
            Stage::GeneratingBrdfLut => {
                if !self.brdf_shader.poll()? {
                    return Ok(false);
                }

                self.generate_brdf_lut()?;
                self.release_temporaries();
                self.stage = Stage::Finished;

                info!("precompute pipeline finished");

                Ok(true)
            }
        }
    }

    fn poll_radiance_map(&mut self) -> Result<bool, Error> {
        if self.radiance_map.is_some() {
            return Ok(true);
        }

        let result = match self.pending_image.as_ref().and_then(PendingImage::poll) {
            Some(result) => result,
            None => return Ok(false),
        };

        self.pending_image = None;
        let image = result?;

        let mut radiance_map = Texture::new(self.gl.clone());
        radiance_map.upload(image.cols, image.rows, &image.to_rgba16f())?;

        debug!("uploaded radiance map ({}x{})", image.cols, image.rows);

        self.radiance_map = Some(radiance_map);

        Ok(true)
    }

    /// Renders the radiance map into every face of the environment map.
    ///
    /// The radiance map is not needed afterwards and is dropped by the caller.
    fn convert_to_environment_map(
        &mut self,
        radiance_map: &Texture<C, RGBA16F>,
    ) -> Result<(), Error> {
        let size = self.config.environment_size;

        self.environment_map
            .create_cube(size, mip_levels_for(size))?;
        self.capture.resize::<RGBA16F>(size)?;

        let command = self.rad2env_shader.begin_draw();
        command.set_depth_test(true);
        command.bind(radiance_map, "u_radianceMap");

        render_cube_faces(
            &command,
            &mut self.capture,
            &self.environment_map,
            0,
            &self.views,
            &self.unit_cube,
        )?;

        self.capture.framebuffer.unbind();
        self.environment_map.generate_mipmaps();

        info!("environment map converted ({}x{})", size, size);

        Ok(())
    }

    fn calculate_irradiance_map(&mut self) -> Result<(), Error> {
        let size = self.config.irradiance_size;

        self.irradiance_map.create_cube(size, 1)?;
        self.capture.resize::<RGBA16F>(size)?;

        let command = self.env2irr_shader.begin_draw();
        command.set_depth_test(true);
        command.bind(&self.environment_map, "u_envMap");

        render_cube_faces(
            &command,
            &mut self.capture,
            &self.irradiance_map,
            0,
            &self.views,
            &self.unit_cube,
        )?;

        self.capture.framebuffer.unbind();

        info!("irradiance map calculated ({}x{})", size, size);

        Ok(())
    }

    fn calculate_prefiltered_map(&mut self) -> Result<(), Error> {
        let size = self.config.prefilter_size;

        self.prefiltered_map.create_cube(size, PREFILTER_LEVELS)?;

        let command = self.env2fil_shader.begin_draw();
        command.set_depth_test(true);
        command.bind(&self.environment_map, "u_envMap");
        command.set_uniform_f32("u_resolution", self.config.environment_size as f32);

        for mip in 0..PREFILTER_LEVELS {
            let (mip_size, roughness) = prefilter_mip(size, mip, PREFILTER_LEVELS);

            self.capture.resize::<RGBA16F>(mip_size)?;
            command.set_uniform_f32("u_roughness", roughness);

            render_cube_faces(
                &command,
                &mut self.capture,
                &self.prefiltered_map,
                mip,
                &self.views,
                &self.unit_cube,
            )?;
        }

        self.capture.framebuffer.unbind();

        info!("prefiltered map calculated ({} levels)", PREFILTER_LEVELS);

        Ok(())
    }

    fn generate_brdf_lut(&mut self) -> Result<(), Error> {
        let size = self.config.brdf_lut_size;

        self.brdf_lut.create(size, size)?;
        self.capture.resize::<RG16F>(size)?;

        self.capture.framebuffer.attach_texture(&self.brdf_lut)?;
        self.capture.framebuffer.check_status()?;

        let command = self.brdf_shader.begin_draw();
        command.set_viewport(0, 0, size as i32, size as i32);
        command.clear(CLEAR_COLOR);

        command.set_vertex_array(&self.unit_quad);
        command.draw(&self.unit_quad);
        command.unset_vertex_array();

        self.capture.framebuffer.unbind();

        info!("BRDF lookup table generated ({}x{})", size, size);

        Ok(())
    }

    /// Drops everything only needed while baking.
    fn release_temporaries(&mut self) {
        self.capture.release();

        self.rad2env_shader.reset();
        self.env2irr_shader.reset();
        self.env2fil_shader.reset();
        self.brdf_shader.reset();

        self.unit_cube.reset();
        self.unit_quad.reset();
    }
}

impl<C: Context> std::fmt::Debug for Precompute<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Precompute")
            .field("stage", &self.stage)
            .field("config", &self.config)
            .field("failure", &self.failure)
            .finish()
    }
}
