//! Result printing: labelled lines or JSON.

use owo_colors::OwoColorize;

use crate::report::{ReportField, ResultVector};

pub struct ResultPrinter {
    pub color: bool,
    pub json: bool,
}

impl ResultPrinter {
    pub fn render(&self, extents: &ResultVector) -> serde_json::Result<String> {
        if self.json {
            return serde_json::to_string_pretty(extents);
        }
        let text = ReportField::ORDER
            .iter()
            .zip(extents.to_array())
            .map(|(field, v)| {
                if self.color {
                    format!("{}: {}", field.label().cyan(), v.green())
                } else {
                    format!("{}: {}", field.label(), v)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }

    pub fn print(&self, extents: &ResultVector) -> serde_json::Result<()> {
        println!("{}", self.render(extents)?);
        Ok(())
    }
}
