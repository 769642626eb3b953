//! Chapter templates.
//!
//! Two named templates render chapter data into standalone XHTML documents:
//! `weather` for the forecast chapter and `article` for each news story.
//! Chapters sit next to `style/` and `art_img/` inside the package, so
//! asset references are relative to the package content directory.

use crate::extract::markup::escape;
use crate::models::{NewsFeedEntry, WeatherPoint, WeatherReport};
use crate::utils::{degrees_to_cardinal, sec_to_day, sec_to_strftime};
use std::fmt::Write;

pub const STYLESHEET_HREF: &str = "style/nav.css";
pub const LANGUAGE: &str = "en";

/// Template names understood by [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Weather,
    Article,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Weather => "weather",
            Template::Article => "article",
        }
    }
}

/// Data handed to a template.
#[derive(Debug)]
pub enum TemplateData<'a> {
    Weather {
        place: &'a str,
        report: &'a WeatherReport,
    },
    Article {
        entry: &'a NewsFeedEntry,
        /// Paragraph markup of the resolved body.
        content: &'a str,
        /// Package-relative path of the embedded lead image.
        image: Option<&'a str>,
    },
}

impl TemplateData<'_> {
    pub fn template(&self) -> Template {
        match self {
            TemplateData::Weather { .. } => Template::Weather,
            TemplateData::Article { .. } => Template::Article,
        }
    }
}

/// Render `data` with its named template.
pub fn render(data: &TemplateData<'_>) -> String {
    match data {
        TemplateData::Weather { place, report } => weather(place, report),
        TemplateData::Article {
            entry,
            content,
            image,
        } => article(entry, content, *image),
    }
}

fn document(title: &str, body: &str) -> String {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="utf-8"?>"#).unwrap();
    writeln!(out, "<!DOCTYPE html>").unwrap();
    writeln!(
        out,
        r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{LANGUAGE}" xml:lang="{LANGUAGE}">"#
    )
    .unwrap();
    writeln!(out, "<head>").unwrap();
    writeln!(out, "<title>{}</title>", escape(title)).unwrap();
    writeln!(
        out,
        r#"<link rel="stylesheet" type="text/css" href="{STYLESHEET_HREF}"/>"#
    )
    .unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, "<body>").unwrap();
    out.push_str(body);
    writeln!(out, "</body>").unwrap();
    write!(out, "</html>").unwrap();
    out
}

fn degrees(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.0}\u{b0}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.0}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn current_conditions(out: &mut String, now: &WeatherPoint) {
    writeln!(out, r#"<section class="currently">"#).unwrap();
    writeln!(out, "<h2>Right now</h2>").unwrap();
    if let Some(summary) = &now.summary {
        writeln!(out, r#"<p class="summary">{}</p>"#, escape(summary)).unwrap();
    }
    writeln!(out, "<ul>").unwrap();
    writeln!(out, "<li>Temperature: {}</li>", degrees(now.temperature)).unwrap();
    writeln!(out, "<li>Feels like: {}</li>", degrees(now.apparentTemperature)).unwrap();
    writeln!(out, "<li>Humidity: {}</li>", percent(now.humidity)).unwrap();
    if let Some(speed) = now.windSpeed {
        let direction = now
            .windBearing
            .map(|b| format!(" from the {}", degrees_to_cardinal(b)))
            .unwrap_or_default();
        writeln!(out, "<li>Wind: {:.0} mph{}</li>", speed, direction).unwrap();
    }
    writeln!(out, "</ul>").unwrap();
    if let Some(time) = now.time {
        writeln!(
            out,
            r#"<p class="observed">Observed {}</p>"#,
            sec_to_strftime(time)
        )
        .unwrap();
    }
    writeln!(out, "</section>").unwrap();
}

fn outlook(out: &mut String, heading: &str, block: &crate::models::WeatherBlock) {
    writeln!(out, r#"<section class="outlook">"#).unwrap();
    writeln!(out, "<h2>{}</h2>", escape(heading)).unwrap();
    if let Some(summary) = &block.summary {
        writeln!(out, r#"<p class="summary">{}</p>"#, escape(summary)).unwrap();
    }
    if !block.data.is_empty() {
        writeln!(out, "<ul>").unwrap();
        for day in &block.data {
            let label = day.time.map(sec_to_day).unwrap_or_default();
            let summary = day.summary.as_deref().map(escape).unwrap_or_default();
            writeln!(
                out,
                "<li><strong>{}</strong> {} High {} / Low {}, {} chance of precipitation</li>",
                escape(&label),
                summary,
                degrees(day.temperatureHigh),
                degrees(day.temperatureLow),
                percent(day.precipProbability)
            )
            .unwrap();
        }
        writeln!(out, "</ul>").unwrap();
    }
    writeln!(out, "</section>").unwrap();
}

/// The `weather` template.
fn weather(place: &str, report: &WeatherReport) -> String {
    let title = format!("Weather for {place}");
    let mut body = String::new();
    writeln!(body, "<h1>{}</h1>", escape(&title)).unwrap();

    if let Some(now) = &report.currently {
        current_conditions(&mut body, now);
    }
    if let Some(hourly) = report.hourly.as_ref().and_then(|h| h.summary.as_ref()) {
        writeln!(body, r#"<p class="hourly">Next hours: {}</p>"#, escape(hourly)).unwrap();
    }
    if let Some(daily) = &report.daily {
        outlook(&mut body, "This week", daily);
    }
    if report.currently.is_none() && report.daily.is_none() {
        writeln!(body, "<p>No forecast data was available.</p>").unwrap();
    }

    document(&title, &body)
}

/// The `article` template.
fn article(entry: &NewsFeedEntry, content: &str, image: Option<&str>) -> String {
    let mut body = String::new();
    writeln!(body, "<h1>{}</h1>", escape(&entry.title)).unwrap();

    let byline = match &entry.author {
        Some(author) => format!("{} | {}", entry.source, author),
        None => entry.source.clone(),
    };
    writeln!(body, r#"<p class="byline">{}</p>"#, escape(&byline)).unwrap();

    if !entry.description.is_empty() {
        writeln!(
            body,
            r#"<p class="description"><em>{}</em></p>"#,
            escape(&entry.description)
        )
        .unwrap();
    }
    if let Some(src) = image {
        writeln!(
            body,
            r#"<div class="lead-image"><img src="{}" alt="{}"/></div>"#,
            escape(src),
            escape(&entry.title)
        )
        .unwrap();
    }

    writeln!(body, r#"<div class="content">"#).unwrap();
    writeln!(body, "{content}").unwrap();
    writeln!(body, "</div>").unwrap();
    writeln!(
        body,
        r#"<p class="original"><a href="{}">Read the original</a></p>"#,
        escape(&entry.url)
    )
    .unwrap();

    document(&entry.title, &body)
}
