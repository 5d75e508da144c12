use cgmath::{perspective, Deg, Matrix4, Point3, Vector3};
use web_sys::WebGl2RenderingContext as GL;

pub const FACE_FIELD_OF_VIEW: f32 = 90.0;
pub const FACE_NEAR_PLANE: f32 = 0.1;
pub const FACE_FAR_PLANE: f32 = 10.0;

/// Cubemap faces, in the order they are rendered and laid out in GL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The `TEXTURE_CUBE_MAP_*` target of this face.
    pub fn target(self) -> u32 {
        GL::TEXTURE_CUBE_MAP_POSITIVE_X + self as u32
    }

    pub fn direction(self) -> Vector3<f32> {
        match self {
            Self::PositiveX => Vector3::unit_x(),
            Self::NegativeX => -Vector3::unit_x(),
            Self::PositiveY => Vector3::unit_y(),
            Self::NegativeY => -Vector3::unit_y(),
            Self::PositiveZ => Vector3::unit_z(),
            Self::NegativeZ => -Vector3::unit_z(),
        }
    }

    pub fn up(self) -> Vector3<f32> {
        match self {
            Self::PositiveY => Vector3::unit_z(),
            Self::NegativeY => -Vector3::unit_z(),
            _ => -Vector3::unit_y(),
        }
    }
}

/// View-projection matrices looking out of the origin through each face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceViews {
    matrices: [Matrix4<f32>; 6],
}

impl FaceViews {
    pub fn new() -> Self {
        let projection: Matrix4<f32> = perspective(
            Deg(FACE_FIELD_OF_VIEW),
            1.0,
            FACE_NEAR_PLANE,
            FACE_FAR_PLANE,
        );

        let origin = Point3::new(0.0, 0.0, 0.0);

        let view = |face: CubeFace| {
            projection * Matrix4::look_at(origin, origin + face.direction(), face.up())
        };

        Self {
            matrices: [
                view(CubeFace::PositiveX),
                view(CubeFace::NegativeX),
                view(CubeFace::PositiveY),
                view(CubeFace::NegativeY),
                view(CubeFace::PositiveZ),
                view(CubeFace::NegativeZ),
            ],
        }
    }

    pub fn view_projection(&self, face: CubeFace) -> &Matrix4<f32> {
        &self.matrices[face.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CubeFace, &Matrix4<f32>)> {
        let faces: &'static [CubeFace; 6] = &CubeFace::ALL;

        faces
            .iter()
            .map(move |&face| (face, self.view_projection(face)))
    }
}

impl Default for FaceViews {
    fn default() -> Self {
        Self::new()
    }
}
