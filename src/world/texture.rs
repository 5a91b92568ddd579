// Format-agnostic repository of 8-bit textures handed over by the asset loader.
// The renderer and surfaces interact through `TextureId` only.

use std::collections::HashMap;

use std::ops::{Index, IndexMut};

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// CPU-side storage: one palette index per texel in row-major order.
///
/// Width and height are powers of two so the rasterizer can wrap
/// coordinates with a mask instead of a modulo.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT_IDX: u8 = 8;
        const DARK_IDX: u8 = 16;
        let mut pix = vec![0u8; 8 * 8];
        for y in 0..8 {
            for x in 0..8 {
                pix[y * 8 + x] = if (x ^ y) & 1 == 0 {
                    LIGHT_IDX
                } else {
                    DARK_IDX
                };
            }
        }
        Texture {
            name: "CHECKER".to_string(),
            w: 8,
            h: 8,
            pixels: pix,
        }
    }
}

impl Texture {
    /// Validate dimensions and wrap raw palette indices.
    pub fn new<S: Into<String>>(
        name: S,
        w: usize,
        h: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if !w.is_power_of_two() || !h.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { name, w, h });
        }
        if pixels.len() != w * h {
            return Err(TextureError::SizeMismatch {
                name,
                expected: w * h,
                got: pixels.len(),
            });
        }
        Ok(Self { name, w, h, pixels })
    }

    /// Build a texture from a per-texel generator.
    pub fn from_fn<S: Into<String>>(
        name: S,
        w: usize,
        h: usize,
        mut f: impl FnMut(usize, usize) -> u8,
    ) -> Result<Self, TextureError> {
        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                pixels.push(f(x, y));
            }
        }
        Self::new(name, w, h, pixels)
    }

    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.w + x]
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Wrap masks need power-of-two sides.
    #[error("texture `{name}` is {w}x{h}, sides must be powers of two")]
    NotPowerOfTwo { name: String, w: usize, h: usize },

    #[error("texture `{name}` expects {expected} texels, got {got}")]
    SizeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// 256-entry lookup from palette index to `0x00RRGGBB`.
#[derive(Clone)]
pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        Palette([0u32; 256])
    }
}
impl Palette {
    /// Build from 768 bytes of packed RGB triples.
    pub fn from_rgb(bytes: &[u8; 768]) -> Self {
        let mut pal = [0u32; 256];
        for (i, rgb) in bytes.chunks_exact(3).enumerate() {
            pal[i] = (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32;
        }
        Palette(pal)
    }

    /// Grey ramp, index 0 = black. Handy for tests and tools.
    pub fn grey() -> Self {
        let mut pal = [0u32; 256];
        for (i, c) in pal.iter_mut().enumerate() {
            let v = i as u32;
            *c = v << 16 | v << 8 | v;
        }
        Palette(pal)
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}

/// A palette-aware, format-agnostic cache of textures.
///
/// * Does **not** know about map or archive formats; the loader decodes those.
/// * Stores exactly one copy of every name.
/// * ID **0** is always the “missing” checkerboard.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`; the struct itself is not `Sync`.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
    palette: Palette,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank with a mandatory *missing* texture used as
    /// fallback.  The texture is inserted under the fixed name `"MISSING"`
    /// and obtains the handle **0**.
    pub fn new(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex],
            palette: Palette::default(),
        }
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Obtain the id for a *loaded* texture by name.
    /// Returns `None` if the name is unknown.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names resolve to the checkerboard id.
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Borrow a texture, falling back to the checkerboard for bad ids.
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        match self.data.get(id as usize) {
            Some(tex) => tex,
            None => {
                log::warn!("texture id {id} out of range, using checkerboard");
                &self.data[NO_TEXTURE as usize]
            }
        }
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tex(color: u8) -> Texture {
        Texture::new("Dummy", 2, 2, vec![color; 4]).unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let mut bank = TextureBank::default_with_checker();
        let red = bank.insert("RED", dummy_tex(0x00)).unwrap();
        let blue = bank.insert("BLUE", dummy_tex(0xFF)).unwrap();

        assert_ne!(red, NO_TEXTURE);
        assert_ne!(blue, red);
        assert_eq!(bank.id("RED"), Some(red));
        assert_eq!(bank.id("BLUE"), Some(blue));
        assert_eq!(bank.id("NOPE"), None);
        assert_eq!(bank.id_or_missing("NOPE"), NO_TEXTURE);

        assert_eq!(bank.texture(red).unwrap().pixels[0], 0x00);
        assert_eq!(bank.texture(blue).unwrap().pixels[0], 0xFF);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut bank = TextureBank::default_with_checker();
        bank.insert("WOOD", dummy_tex(1)).unwrap();
        let err = bank.insert("WOOD", dummy_tex(2)).unwrap_err();
        assert_eq!(err, TextureError::Duplicate("WOOD".into()));
        // texture count still 2 (checker + first WOOD)
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn bad_id_guard() {
        let bank = TextureBank::default_with_checker();
        let bad = TextureId::MAX;
        assert_eq!(bank.texture(bad).unwrap_err(), TextureError::BadId(bad));
        assert_eq!(bank.texture_or_missing(bad).name, "CHECKER");
    }

    #[test]
    fn sides_must_be_pow2() {
        let err = Texture::new("ODD", 3, 4, vec![0; 12]).unwrap_err();
        assert!(matches!(err, TextureError::NotPowerOfTwo { w: 3, h: 4, .. }));

        let err = Texture::new("SHORT", 4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected: 16, got: 15, .. }));
    }

    #[test]
    fn palette_packs_rgb() {
        let mut raw = [0u8; 768];
        raw[3] = 0x12;
        raw[4] = 0x34;
        raw[5] = 0x56;
        let pal = Palette::from_rgb(&raw);
        assert_eq!(pal[1], 0x0012_3456);
        assert_eq!(Palette::grey()[255], 0x00FF_FFFF);
    }
}
