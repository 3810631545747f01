/// Fixed ordered series palette. Assignment is by series index modulo the
/// palette length, so a given series order always recolors identically.
pub struct ColorPalette {
    colors: Vec<&'static str>,
}

impl ColorPalette {
    /// The default chart series colors.
    pub fn default_series() -> Self {
        Self {
            colors: vec!["#8884d8", "#82ca9d", "#ffc658", "#ff7f50", "#a4de6c"],
        }
    }

    pub fn color_for(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_wrap_around() {
        let palette = ColorPalette::default_series();
        assert_eq!(palette.color_for(0), "#8884d8");
        assert_eq!(palette.color_for(5), "#8884d8");
        assert_eq!(palette.color_for(6), "#82ca9d");
    }
}
