use std::fmt;

/// Position of the precompute pipeline, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    PreparingResources,
    LoadingRadianceSource,
    ConvertingToEnvironmentMap,
    CalculatingIrradianceMap,
    CalculatingPrefilteredMap,
    GeneratingBrdfLut,
    Finished,
}

impl Stage {
    pub fn is_finished(self) -> bool {
        self == Self::Finished
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::PreparingResources
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::PreparingResources => "preparing resources",
            Self::LoadingRadianceSource => "loading radiance source",
            Self::ConvertingToEnvironmentMap => "converting to environment map",
            Self::CalculatingIrradianceMap => "calculating irradiance map",
            Self::CalculatingPrefilteredMap => "calculating prefiltered map",
            Self::GeneratingBrdfLut => "generating BRDF lookup table",
            Self::Finished => "finished",
        })
    }
}
