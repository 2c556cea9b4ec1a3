use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Categorical color scheme, cycled when there are more categories than colors
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<Rgb>,
}

impl ColorPalette {
    /// The ten-color "tableau10" scheme
    pub fn tableau10() -> Self {
        Self {
            colors: vec![
                Rgb(0x4c, 0x78, 0xa8),
                Rgb(0xf5, 0x85, 0x18),
                Rgb(0xe4, 0x57, 0x56),
                Rgb(0x72, 0xb7, 0xb2),
                Rgb(0x54, 0xa2, 0x4b),
                Rgb(0xee, 0xca, 0x3b),
                Rgb(0xb2, 0x79, 0xa2),
                Rgb(0xff, 0x9d, 0xa6),
                Rgb(0x9d, 0x75, 0x5d),
                Rgb(0xba, 0xb0, 0xac),
            ],
        }
    }

    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }

    /// Color for an optional series key, by its position in the legend
    pub fn color_for(&self, legend: &[String], key: Option<&str>) -> Rgb {
        key.and_then(|k| legend.iter().position(|l| l == k))
            .map(|i| self.color(i))
            .unwrap_or_else(|| self.color(0))
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::tableau10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let p = ColorPalette::tableau10();
        assert_eq!(p.color(0), p.color(10));
        assert_ne!(p.color(0), p.color(1));
    }

    #[test]
    fn test_color_for_legend_position() {
        let p = ColorPalette::default();
        let legend = vec!["Owner".to_string(), "Renter".to_string()];
        assert_eq!(p.color_for(&legend, Some("Renter")), p.color(1));
        assert_eq!(p.color_for(&legend, None), p.color(0));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb(76, 120, 168).to_hex(), "#4c78a8");
    }
}
