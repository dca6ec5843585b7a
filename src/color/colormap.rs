//! Colormap arithmetic: TrueColor mask decoding, explicit overlays, and
//! the writable-cell allocator for pseudo-colour maps.
//!
//! TrueColor lookups decode through the visual's channel masks unless an
//! overlay was stored for that exact pixel (AllocColor and StoreColors
//! write overlays); writable visuals allocate cells out of a flag vector
//! with a first-fit linear scan.

use std::collections::HashMap;

use crate::protocol::errors::XError;
use crate::protocol::replies::Rgb16;
use crate::protocol::setup::Visual;
use crate::protocol::types::{ClientId, ColorFlags, ColormapId};

#[derive(Debug, Clone)]
pub struct ColormapRecord {
    pub id: ColormapId,
    pub visual: Visual,
    pub installed: bool,
    /// Explicitly stored colours, keyed by pixel value. On TrueColor
    /// visuals these are overlays that win over the mask decode.
    entries: HashMap<u32, Rgb16>,
    /// Allocation flags for writable cells (empty on read-only visuals).
    writable: Vec<bool>,
    /// Which client allocated which pixel, for targeted release.
    owners: HashMap<u32, ClientId>,
}

fn channel_of(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    ((pixel & mask) >> mask.trailing_zeros()) as u8
}

fn widen(channel8: u8) -> u16 {
    (channel8 as u16) << 8
}

impl ColormapRecord {
    pub fn new(id: ColormapId, visual: Visual) -> Self {
        let writable = if visual.class.is_writable() {
            vec![false; visual.colormap_entries as usize]
        } else {
            Vec::new()
        };
        Self { id, visual, installed: false, entries: HashMap::new(), writable, owners: HashMap::new() }
    }

    /// Decode a pixel to 8-bit channels through the visual's masks,
    /// ignoring overlays.
    pub fn decode_masks(&self, pixel: u32) -> (u8, u8, u8) {
        (
            channel_of(pixel, self.visual.red_mask),
            channel_of(pixel, self.visual.green_mask),
            channel_of(pixel, self.visual.blue_mask),
        )
    }

    /// Full lookup: stored entry if present, otherwise the mask decode.
    pub fn query(&self, pixel: u32) -> Rgb16 {
        if let Some(stored) = self.entries.get(&pixel) {
            return *stored;
        }
        let (r, g, b) = self.decode_masks(pixel);
        Rgb16 { red: widen(r), green: widen(g), blue: widen(b) }
    }

    /// Compose a TrueColor pixel from 16-bit channels (8 significant bits
    /// per channel).
    pub fn compose_pixel(&self, red: u16, green: u16, blue: u16) -> u32 {
        let place = |channel16: u16, mask: u32| -> u32 {
            if mask == 0 {
                return 0;
            }
            ((channel16 >> 8) as u32) << mask.trailing_zeros() & mask
        };
        place(red, self.visual.red_mask)
            | place(green, self.visual.green_mask)
            | place(blue, self.visual.blue_mask)
    }

    /// AllocColor: on TrueColor, build the pixel and store the quantised
    /// triple as an overlay; on a writable visual, claim the first free
    /// cell. Replies with the quantised RGB actually stored.
    pub fn alloc_color(
        &mut self,
        client: ClientId,
        red: u16,
        green: u16,
        blue: u16,
    ) -> Result<(u32, Rgb16), XError> {
        let quantised = Rgb16 {
            red: widen((red >> 8) as u8),
            green: widen((green >> 8) as u8),
            blue: widen((blue >> 8) as u8),
        };
        if self.visual.class.is_writable() {
            let cell = self
                .writable
                .iter()
                .position(|used| !used)
                .ok_or_else(XError::alloc)?;
            self.writable[cell] = true;
            let pixel = cell as u32;
            self.entries.insert(pixel, quantised);
            self.owners.insert(pixel, client);
            return Ok((pixel, quantised));
        }
        let pixel = self.compose_pixel(red, green, blue);
        self.entries.insert(pixel, quantised);
        self.owners.insert(pixel, client);
        Ok((pixel, quantised))
    }

    /// AllocColorCells: `count` writable cells, contiguous when asked.
    /// Read-only visuals refuse with `Access`; exhaustion is `Alloc`.
    pub fn alloc_cells(
        &mut self,
        client: ClientId,
        count: u16,
        contiguous: bool,
    ) -> Result<Vec<u32>, XError> {
        if !self.visual.class.is_writable() {
            return Err(XError::access());
        }
        if count == 0 {
            return Err(XError::value(0));
        }
        let want = count as usize;
        let cells = if contiguous {
            self.find_contiguous_run(want).ok_or_else(XError::alloc)?
        } else {
            let free: Vec<usize> = self
                .writable
                .iter()
                .enumerate()
                .filter(|(_, used)| !**used)
                .map(|(index, _)| index)
                .take(want)
                .collect();
            if free.len() < want {
                return Err(XError::alloc());
            }
            free
        };
        for &cell in &cells {
            self.writable[cell] = true;
            self.owners.insert(cell as u32, client);
        }
        Ok(cells.iter().map(|&cell| cell as u32).collect())
    }

    fn find_contiguous_run(&self, want: usize) -> Option<Vec<usize>> {
        let mut run_start = 0usize;
        let mut run_len = 0usize;
        for (index, used) in self.writable.iter().enumerate() {
            if *used {
                run_len = 0;
                run_start = index + 1;
            } else {
                run_len += 1;
                if run_len == want {
                    return Some((run_start..=index).collect());
                }
            }
        }
        None
    }

    /// StoreColors: update the listed pixels' channel subset. Writable
    /// visuals require the cell to be allocated; TrueColor stores an
    /// overlay over the mask decode.
    pub fn store_color(
        &mut self,
        pixel: u32,
        red: u16,
        green: u16,
        blue: u16,
        flags: ColorFlags,
    ) -> Result<(), XError> {
        if self.visual.class.is_writable() {
            let cell = pixel as usize;
            if cell >= self.writable.len() {
                return Err(XError::value(pixel));
            }
            if !self.writable[cell] {
                return Err(XError::access());
            }
        }
        let mut stored = self.query(pixel);
        if flags.contains(ColorFlags::DO_RED) {
            stored.red = red;
        }
        if flags.contains(ColorFlags::DO_GREEN) {
            stored.green = green;
        }
        if flags.contains(ColorFlags::DO_BLUE) {
            stored.blue = blue;
        }
        self.entries.insert(pixel, stored);
        Ok(())
    }

    /// FreeColors: drop the allocation flag and the stored entry.
    pub fn free_colors(&mut self, pixels: &[u32]) {
        for &pixel in pixels {
            self.entries.remove(&pixel);
            self.owners.remove(&pixel);
            let cell = pixel as usize;
            if cell < self.writable.len() {
                self.writable[cell] = false;
            }
        }
    }

    /// Release everything `client` allocated here (disconnect path).
    pub fn free_client(&mut self, client: ClientId) {
        let pixels: Vec<u32> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == client)
            .map(|(pixel, _)| *pixel)
            .collect();
        self.free_colors(&pixels);
    }

    /// CopyColormapAndFree: move `requester`'s allocations out of `self`
    /// into a fresh map with `new_id`. Returns the new record and whether
    /// the source is now empty of allocations.
    pub fn copy_and_free(&mut self, new_id: ColormapId, requester: ClientId) -> (ColormapRecord, bool) {
        let mut copy = ColormapRecord::new(new_id, self.visual);
        let moved: Vec<u32> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == requester)
            .map(|(pixel, _)| *pixel)
            .collect();
        for pixel in moved {
            if let Some(color) = self.entries.get(&pixel) {
                copy.entries.insert(pixel, *color);
            }
            copy.owners.insert(pixel, requester);
            let cell = pixel as usize;
            if cell < copy.writable.len() {
                copy.writable[cell] = true;
            }
            self.free_colors(&[pixel]);
        }
        (copy, self.owners.is_empty())
    }

    pub fn allocation_count(&self) -> usize {
        self.owners.len()
    }

    pub fn stored_entry(&self, pixel: u32) -> Option<Rgb16> {
        self.entries.get(&pixel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::errors::ErrorCode;
    use crate::protocol::types::VisualClass;

    fn true_color() -> ColormapRecord {
        ColormapRecord::new(1, Visual::true_color_24(1))
    }

    fn pseudo_color() -> ColormapRecord {
        let visual = Visual {
            id: 2,
            class: VisualClass::PseudoColor,
            bits_per_rgb: 8,
            colormap_entries: 16,
            red_mask: 0,
            green_mask: 0,
            blue_mask: 0,
        };
        ColormapRecord::new(2, visual)
    }

    #[test]
    fn mask_decode() {
        let cmap = true_color();
        assert_eq!(cmap.decode_masks(0x0012_3456), (0x12, 0x34, 0x56));
    }

    #[test]
    fn alloc_color_composes_pixel_and_echoes_quantised_rgb() {
        let mut cmap = true_color();
        let (pixel, rgb) = cmap.alloc_color(2, 0x8000, 0x4000, 0x2000).unwrap();
        assert_eq!(pixel, 0x0080_4020);
        assert_eq!(rgb, Rgb16 { red: 0x8000, green: 0x4000, blue: 0x2000 });
        assert_eq!(cmap.query(pixel), rgb);
    }

    #[test]
    fn overlay_beats_mask_decode() {
        let mut cmap = true_color();
        cmap.store_color(0x00ff_0000, 0x1111, 0x2222, 0x3333, ColorFlags::all()).unwrap();
        assert_eq!(cmap.query(0x00ff_0000), Rgb16 { red: 0x1111, green: 0x2222, blue: 0x3333 });
        // untouched pixels still decode through the masks
        assert_eq!(cmap.query(0x0000_ff00), Rgb16 { red: 0, green: 0xff00, blue: 0 });
    }

    #[test]
    fn store_colors_partial_flags() {
        let mut cmap = true_color();
        cmap.store_color(0x0012_3456, 0xaaaa, 0, 0, ColorFlags::DO_RED).unwrap();
        let rgb = cmap.query(0x0012_3456);
        assert_eq!(rgb.red, 0xaaaa);
        assert_eq!(rgb.green, 0x3400);
        assert_eq!(rgb.blue, 0x5600);
    }

    #[test]
    fn alloc_cells_on_true_color_is_access_error() {
        let mut cmap = true_color();
        let err = cmap.alloc_cells(2, 4, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::Access);
    }

    #[test]
    fn alloc_cells_first_fit_and_exhaustion() {
        let mut cmap = pseudo_color();
        let first = cmap.alloc_cells(2, 4, true).unwrap();
        assert_eq!(first, vec![0, 1, 2, 3]);
        let second = cmap.alloc_cells(2, 12, true).unwrap();
        assert_eq!(second[0], 4);
        let err = cmap.alloc_cells(2, 1, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::Alloc);
    }

    #[test]
    fn contiguous_run_skips_gaps() {
        let mut cmap = pseudo_color();
        cmap.alloc_cells(2, 3, true).unwrap(); // 0..3
        cmap.free_colors(&[1]);
        // a 2-cell contiguous run cannot use the lone free cell 1
        let cells = cmap.alloc_cells(2, 2, true).unwrap();
        assert_eq!(cells, vec![3, 4]);
    }

    #[test]
    fn store_to_unallocated_writable_cell_is_access() {
        let mut cmap = pseudo_color();
        let err = cmap.store_color(5, 1, 1, 1, ColorFlags::all()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Access);
        let err = cmap.store_color(99, 1, 1, 1, ColorFlags::all()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Value);
    }

    #[test]
    fn free_colors_releases_cells_and_overlays() {
        let mut cmap = pseudo_color();
        let cells = cmap.alloc_cells(2, 2, false).unwrap();
        cmap.store_color(cells[0], 1, 2, 3, ColorFlags::all()).unwrap();
        cmap.free_colors(&cells);
        assert_eq!(cmap.allocation_count(), 0);
        assert!(cmap.stored_entry(cells[0]).is_none());
        // the cell is reusable again
        assert_eq!(cmap.alloc_cells(3, 1, false).unwrap(), vec![0]);
    }

    #[test]
    fn copy_and_free_moves_only_requester_allocations() {
        let mut cmap = pseudo_color();
        cmap.alloc_color(2, 0x1000, 0x2000, 0x3000).unwrap();
        cmap.alloc_color(3, 0x4000, 0x5000, 0x6000).unwrap();
        let (copy, emptied) = cmap.copy_and_free(9, 2);
        assert!(!emptied);
        assert_eq!(copy.allocation_count(), 1);
        assert_eq!(cmap.allocation_count(), 1);
        let (_, emptied) = cmap.copy_and_free(10, 3);
        assert!(emptied);
    }
}
