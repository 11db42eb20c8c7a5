use std::fmt;

/// Key selecting one post-processing module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PpIndex {
    Null,
    Nv12LoadSaveN12,
    Nv12LoadSavePl3,
    Pl3LoadSaveN12,
    Pl3LoadSavePl3,
    Nv12Scaling,
    Nv12Avs,
    Nv12Dndi,
    Nv12Dn,
    Nv12LoadSavePa,
    Pl3LoadSavePa,
    PaLoadSaveNv12,
    PaLoadSavePl3,
    PaLoadSavePa,
    RgbxLoadSaveNv12,
    Nv12LoadSaveRgbx,
}

impl PpIndex {
    pub const COUNT: usize = 16;

    /// Every index in table order.
    pub const ALL: [PpIndex; Self::COUNT] = [
        PpIndex::Null,
        PpIndex::Nv12LoadSaveN12,
        PpIndex::Nv12LoadSavePl3,
        PpIndex::Pl3LoadSaveN12,
        PpIndex::Pl3LoadSavePl3,
        PpIndex::Nv12Scaling,
        PpIndex::Nv12Avs,
        PpIndex::Nv12Dndi,
        PpIndex::Nv12Dn,
        PpIndex::Nv12LoadSavePa,
        PpIndex::Pl3LoadSavePa,
        PpIndex::PaLoadSaveNv12,
        PpIndex::PaLoadSavePl3,
        PpIndex::PaLoadSavePa,
        PpIndex::RgbxLoadSaveNv12,
        PpIndex::Nv12LoadSaveRgbx,
    ];

    /// Position in a module table.
    pub fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PpIndex::Null => "PP_NULL",
            PpIndex::Nv12LoadSaveN12 => "PP_NV12_LOAD_SAVE_N12",
            PpIndex::Nv12LoadSavePl3 => "PP_NV12_LOAD_SAVE_PL3",
            PpIndex::Pl3LoadSaveN12 => "PP_PL3_LOAD_SAVE_N12",
            PpIndex::Pl3LoadSavePl3 => "PP_PL3_LOAD_SAVE_PL3",
            PpIndex::Nv12Scaling => "PP_NV12_SCALING",
            PpIndex::Nv12Avs => "PP_NV12_AVS",
            PpIndex::Nv12Dndi => "PP_NV12_DNDI",
            PpIndex::Nv12Dn => "PP_NV12_DN",
            PpIndex::Nv12LoadSavePa => "PP_NV12_LOAD_SAVE_PA",
            PpIndex::Pl3LoadSavePa => "PP_PL3_LOAD_SAVE_PA",
            PpIndex::PaLoadSaveNv12 => "PP_PA_LOAD_SAVE_NV12",
            PpIndex::PaLoadSavePl3 => "PP_PA_LOAD_SAVE_PL3",
            PpIndex::PaLoadSavePa => "PP_PA_LOAD_SAVE_PA",
            PpIndex::RgbxLoadSaveNv12 => "PP_RGBX_LOAD_SAVE_NV12",
            PpIndex::Nv12LoadSaveRgbx => "PP_NV12_LOAD_SAVE_RGBX",
        }
    }
}

impl fmt::Display for PpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
