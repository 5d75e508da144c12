#![deny(unsafe_code)]

macro_rules! export {
    [$( $module:ident ),* $(,)*] => {
        $(
            mod $module;
            pub use self::$module::*;
        )*
    };
}

export![config, engine, error, loader, precompute, web];

/// GLSL shaders.
pub mod shader {
    /// A preprocessed shader stage emitted by the build script.
    #[derive(Debug)]
    pub struct ShaderInfo {
        pub name: &'static str,
        pub code: &'static str,
        pub defines: &'static [&'static str],
        pub texture_units: &'static [&'static str],
    }

    include!(concat!(env!("OUT_DIR"), "/glsl_shaders.rs"));
}

/// Build-time information.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
