//! RPG Maker XP value types.
//!
//! These are the user-defined classes that appear in RMXP data files. Each
//! has a fixed little-endian binary layout and registers against the
//! [`Registry`] under its Ruby class name.

use bytes::Buf;

use crate::error::MarshalError;
use crate::registry::Registry;

/// An RGBA color; components are doubles in 0.0..=255.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub fn from_payload(mut payload: &[u8]) -> Result<Self, MarshalError> {
        if payload.len() != 32 {
            return Err(MarshalError::custom(format!(
                "Color payload must be 32 bytes, got {}",
                payload.len()
            )));
        }
        Ok(Self {
            red: payload.get_f64_le(),
            green: payload.get_f64_le(),
            blue: payload.get_f64_le(),
            alpha: payload.get_f64_le(),
        })
    }
}

/// A tone adjustment; color shifts in -255.0..=255.0, gray in 0.0..=255.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub gray: f64,
}

impl Tone {
    pub fn from_payload(mut payload: &[u8]) -> Result<Self, MarshalError> {
        if payload.len() != 32 {
            return Err(MarshalError::custom(format!(
                "Tone payload must be 32 bytes, got {}",
                payload.len()
            )));
        }
        Ok(Self {
            red: payload.get_f64_le(),
            green: payload.get_f64_le(),
            blue: payload.get_f64_le(),
            gray: payload.get_f64_le(),
        })
    }
}

/// A 1-, 2-, or 3-dimensional grid of 16-bit cells, stored x-fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub dim: u32,
    pub xsize: u32,
    pub ysize: u32,
    pub zsize: u32,
    data: Vec<u16>,
}

impl Table {
    pub fn from_payload(mut payload: &[u8]) -> Result<Self, MarshalError> {
        if payload.len() < 20 {
            return Err(MarshalError::custom(format!(
                "Table header must be 20 bytes, got {}",
                payload.len()
            )));
        }
        let dim = payload.get_u32_le();
        let xsize = payload.get_u32_le();
        let ysize = payload.get_u32_le();
        let zsize = payload.get_u32_le();
        let size = payload.get_u32_le();
        if u64::from(xsize) * u64::from(ysize) * u64::from(zsize) != u64::from(size) {
            return Err(MarshalError::custom(
                "Table size does not match xsize * ysize * zsize",
            ));
        }
        if payload.remaining() != size as usize * 2 {
            return Err(MarshalError::custom(format!(
                "Table data must be {} bytes, got {}",
                size as usize * 2,
                payload.remaining()
            )));
        }
        let data = (0..size).map(|_| payload.get_u16_le()).collect();
        Ok(Self {
            dim,
            xsize,
            ysize,
            zsize,
            data,
        })
    }

    /// Cell at `(x, y, z)`, or `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<u16> {
        if x >= self.xsize || y >= self.ysize || z >= self.zsize {
            return None;
        }
        let index = (z * self.xsize * self.ysize + y * self.xsize + x) as usize;
        self.data.get(index).copied()
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }
}

/// Registers decoders for all RMXP classes.
pub fn register_rmxp(registry: &mut Registry) {
    registry.register("Color", Color::from_payload);
    registry.register("Tone", Tone::from_payload);
    registry.register("Table", Table::from_payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;

    fn doubles(values: [f64; 4]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn color_from_payload() {
        let c = Color::from_payload(&doubles([255.0, 128.0, 0.0, 200.0])).unwrap();
        assert_eq!(
            c,
            Color {
                red: 255.0,
                green: 128.0,
                blue: 0.0,
                alpha: 200.0
            }
        );
    }

    #[test]
    fn color_rejects_short_payload() {
        assert!(matches!(
            Color::from_payload(&[0u8; 16]),
            Err(MarshalError::Custom(_))
        ));
    }

    #[test]
    fn tone_from_payload() {
        let t = Tone::from_payload(&doubles([-60.0, -40.0, -20.0, 80.0])).unwrap();
        assert_eq!(t.gray, 80.0);
        assert_eq!(t.red, -60.0);
    }

    fn table_payload(dim: u32, x: u32, y: u32, z: u32, cells: &[u16]) -> Vec<u8> {
        let mut p = Vec::new();
        for v in [dim, x, y, z, cells.len() as u32] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        for c in cells {
            p.extend_from_slice(&c.to_le_bytes());
        }
        p
    }

    #[test]
    fn table_indexing_is_x_fastest() {
        // 2x2x2: cell value encodes its coordinates.
        let cells = [0, 1, 10, 11, 100, 101, 110, 111];
        let t = Table::from_payload(&table_payload(3, 2, 2, 2, &cells)).unwrap();
        assert_eq!(t.get(0, 0, 0), Some(0));
        assert_eq!(t.get(1, 0, 0), Some(1));
        assert_eq!(t.get(0, 1, 0), Some(10));
        assert_eq!(t.get(1, 1, 1), Some(111));
        assert_eq!(t.get(2, 0, 0), None);
    }

    #[test]
    fn table_rejects_size_mismatch() {
        // Header claims 2x2x2 but size field says 7.
        let mut p = Vec::new();
        for v in [3u32, 2, 2, 2, 7] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        p.extend_from_slice(&[0u8; 14]);
        assert!(matches!(
            Table::from_payload(&p),
            Err(MarshalError::Custom(_))
        ));
    }

    #[test]
    fn decodes_color_from_stream() {
        let mut registry = Registry::new();
        register_rmxp(&mut registry);

        // u :Color, 32-byte payload
        let mut input = b"\x04\x08u:\x0aColor\x01\x20".to_vec();
        input.extend_from_slice(&doubles([10.0, 20.0, 30.0, 255.0]));

        let v = decode(&input, &registry).unwrap();
        let custom = v.as_custom().unwrap();
        assert_eq!(custom.class_name().name(), "Color");
        let color = custom.downcast_ref::<Color>().unwrap();
        assert_eq!(color.blue, 30.0);
        assert_eq!(color.alpha, 255.0);
    }
}
