// src/constants.rs

/// Width of the zero-padded slice index in 2D per-slice filenames.
pub const SLICE_PAD_WIDTH: usize = 4;

/// Placeholder that external tools substitute with the slice index when
/// reading or writing an image stack (`folder/####.ext`).
pub const STACK_PATTERN: &str = "####";

/// Name of the setting that switches between per-slice (2D) and whole-stack
/// (3D) file layouts.
pub const SETTING_THREE_D: &str = "threeD";

/// Parsed-argument attribute holding the temporary working directory.
pub const ATTR_TEMP: &str = "temp";

/// Default flag token emitted ahead of a mask path.
pub const DEFAULT_MASK_FLAG: &str = "-m";

/// Default folder name for mask images.
pub const DEFAULT_MASK_FOLDER: &str = "msk";

/// Default extension for mask images.
pub const DEFAULT_MASK_EXT: &str = "mha";
