use regex::Regex;
use std::collections::BTreeSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const SHADER_DIR: &str = "shaders";

fn main() {
    built::write_built_file().expect("failed to acquire build-time information");

    println!("cargo:rerun-if-changed={}", SHADER_DIR);

    let mut entries: Vec<PathBuf> = fs::read_dir(SHADER_DIR)
        .expect("failed to read shader directory")
        .map(|entry| entry.expect("failed to read shader entry").path())
        .filter(|path| matches!(extension(path), "vert" | "frag"))
        .collect();

    entries.sort();

    let mut output = String::new();

    for path in &entries {
        println!("cargo:rerun-if-changed={}", path.display());

        let shader = ShaderSource::load(path);

        writeln!(
            output,
            "pub static {}: ShaderInfo = ShaderInfo {{\n    name: {:?},\n    code: {:?},\n    defines: &{:?},\n    texture_units: &{:?},\n}};\n",
            shader.symbol(),
            shader.name,
            shader.code,
            shader.defines,
            shader.texture_units,
        )
        .unwrap();
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    fs::write(out_dir.join("glsl_shaders.rs"), output).expect("failed to write shader table");
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

struct ShaderSource {
    name: String,
    code: String,
    defines: Vec<String>,
    texture_units: Vec<String>,
}

impl ShaderSource {
    fn load(path: &Path) -> Self {
        let include = Regex::new(r#"^#include <([[:graph:]]*)>$"#).unwrap();
        let define = Regex::new(r#"^// @define ([A-Za-z_][A-Za-z0-9_]*)$"#).unwrap();
        let sampler =
            Regex::new(r#"^\s*uniform\s+sampler(?:2D|Cube)\s+([A-Za-z_][A-Za-z0-9_]*)\s*;"#)
                .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let source = fs::read_to_string(path).expect("failed to read shader source");

        let mut code = format!("// __POS__ {}:1\n", name);
        let mut defines = BTreeSet::new();
        let mut texture_units = BTreeSet::new();

        for (index, line) in source.lines().enumerate() {
            if let Some(captures) = include.captures(line) {
                let header = &captures[1];
                let header_path = Path::new(SHADER_DIR).join(header);

                println!("cargo:rerun-if-changed={}", header_path.display());

                let header_source = fs::read_to_string(&header_path)
                    .unwrap_or_else(|_| panic!("{}: missing header <{}>", name, header));

                writeln!(code, "// __POS__ {}:1", header).unwrap();
                code += &header_source;
                code += "\n";
                writeln!(code, "// __POS__ {}:{}", name, index + 2).unwrap();
                continue;
            }

            if let Some(captures) = define.captures(line) {
                defines.insert(captures[1].to_owned());
            }

            if let Some(captures) = sampler.captures(line) {
                texture_units.insert(captures[1].to_owned());
            }

            code += line;
            code += "\n";
        }

        Self {
            name,
            code,
            defines: defines.into_iter().collect(),
            texture_units: texture_units.into_iter().collect(),
        }
    }

    /// `unit_cube.vert` becomes `VS_UNIT_CUBE`, `brdf.frag` becomes `FS_BRDF`.
    fn symbol(&self) -> String {
        let (stem, ext) = self.name.rsplit_once('.').unwrap();

        let prefix = if ext == "vert" { "VS" } else { "FS" };

        format!("{}_{}", prefix, stem.to_uppercase().replace('-', "_"))
    }
}
