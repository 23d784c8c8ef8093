use crate::aggregate::Aggregation;
use crate::config::Rgb;
use crate::error::ReportError;

/// Endpoint → palette entry, by order of first appearance in the dataset.
///
/// The palette is cycled when there are more endpoints than colors.
#[derive(Debug, Clone)]
pub struct ColorAssignment {
    entries: Vec<(String, Rgb)>,
}

impl ColorAssignment {
    /// `endpoints` must already be in first-appearance order and distinct.
    /// An empty palette is a configuration error.
    pub fn new<'a>(
        endpoints: impl IntoIterator<Item = &'a str>,
        palette: &[Rgb],
    ) -> Result<Self, ReportError> {
        if palette.is_empty() {
            return Err(ReportError::Config(
                "style.palette must contain at least one color".to_string(),
            ));
        }
        let entries = endpoints
            .into_iter()
            .zip(palette.iter().cycle())
            .map(|(name, color)| (name.to_string(), *color))
            .collect();
        Ok(Self { entries })
    }

    pub fn from_aggregation(aggregation: &Aggregation, palette: &[Rgb]) -> Result<Self, ReportError> {
        Self::new(aggregation.endpoints(), palette)
    }

    pub fn color_of(&self, endpoint: &str) -> Option<Rgb> {
        self.entries
            .iter()
            .find(|(name, _)| name == endpoint)
            .map(|(_, color)| *color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(name, color)| (name.as_str(), *color))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
