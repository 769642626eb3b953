//! Weather chapter builder: a pure transform from forecast to chapter.

use crate::models::{ChapterKey, ChapterRecord, WeatherReport};
use crate::outputs::templates::{self, TemplateData};
use tracing::debug;

pub const WEATHER_TITLE: &str = "Current Weather";

/// Render the forecast for `place` into the fixed weather chapter.
pub fn build_weather_chapter(place: &str, report: &WeatherReport) -> ChapterRecord {
    let data = TemplateData::Weather { place, report };
    let markup = templates::render(&data);
    debug!(template = data.template().name(), bytes = markup.len(), "Rendered weather chapter");

    ChapterRecord {
        key: ChapterKey::Weather,
        title: WEATHER_TITLE.to_string(),
        markup,
    }
}
