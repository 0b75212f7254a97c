//! # Mosaic HTML report
//!
//! Renders a mosaic grid as a static HTML page with one [Aladin Lite](https://aladin.u-strasbg.fr/)
//! viewer per panel, laid out in flex rows matching the grid rows. Each viewer shows the DSS2
//! colour survey at the panel centre with the camera horizontal field of view.
//!
//! The page loads jQuery and Aladin Lite v2 from their public servers; nothing is bundled.
//!
//! ## See also
//! ------------
//! * [`crate::mosaic::tile`] – grid computation.
use std::fs;

use camino::Utf8Path;
use itertools::Itertools;
use log::info;

use crate::astromosaic_errors::AstroMosaicError;
use crate::mosaic::MosaicPanel;

const ALADIN_CSS: &str = "https://aladin.u-strasbg.fr/AladinLite/api/v2/latest/aladin.min.css";
const ALADIN_JS: &str = "https://aladin.u-strasbg.fr/AladinLite/api/v2/latest/aladin.min.js";
const JQUERY_JS: &str = "https://code.jquery.com/jquery-1.12.1.min.js";
const DEFAULT_SURVEY: &str = "P/DSS2/color";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builder of the HTML page for a mosaic.
#[derive(Debug, Clone)]
pub struct MosaicReport {
    name: String,
    telescope: String,
    image_width_px: u32,
    survey: String,
    command_line: Option<String>,
}

impl MosaicReport {
    /// Page titled `"<name> <telescope>"`.
    pub fn new(name: &str, telescope: &str) -> Self {
        MosaicReport {
            name: name.to_string(),
            telescope: telescope.to_string(),
            image_width_px: 300,
            survey: DEFAULT_SURVEY.to_string(),
            command_line: None,
        }
    }

    /// Width of each viewer; the height follows the field of view aspect ratio.
    pub fn image_width(mut self, px: u32) -> Self {
        self.image_width_px = px.max(1);
        self
    }

    pub fn survey(mut self, survey: &str) -> Self {
        self.survey = survey.to_string();
        self
    }

    /// Command line printed under the title so the page can be regenerated.
    pub fn command_line<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command_line = Some(args.into_iter().map(|a| a.as_ref().to_string()).join(" "));
        self
    }

    /// Render the page for `rows` of panels.
    pub fn render(&self, rows: &[Vec<MosaicPanel>]) -> String {
        let title = escape(&format!("{} {}", self.name, self.telescope));
        let mut html = String::new();

        html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
        html.push_str(&format!("<link rel=\"stylesheet\" href=\"{ALADIN_CSS}\" />\n"));
        html.push_str(
            "<style>\n\
             .flex-container {\n  display: flex;\n  flex-direction: row;\n}\n\
             .flex-container > div {\n  margin: 5px;\n  padding: 5px;\n  font-size: 20px;\n}\n\
             </style>\n",
        );
        html.push_str(&format!("    <title>{title}</title>\n"));
        html.push_str("    <meta charset=\"UTF-8\" />\n</head>\n<body>\n");
        html.push_str(&format!(
            "<script type=\"text/javascript\" src=\"{JQUERY_JS}\" charset=\"utf-8\"></script>\n"
        ));
        html.push_str(&format!(
            "<script type=\"text/javascript\" src=\"{ALADIN_JS}\" charset=\"utf-8\"></script>\n"
        ));
        html.push_str(&format!("<h1>{title}</h1>\n<p>\n"));
        html.push_str(" Images from https://aladin.u-strasbg.fr/\n<br>\n");
        if let Some(cmd) = &self.command_line {
            html.push_str(&format!("Command line: {}\n", escape(cmd)));
        }
        html.push_str("</p>\n");

        let panels = rows.iter().flatten().collect_vec();

        let mut index = 0;
        for row in rows {
            html.push_str("<div class=\"flex-container\">\n");
            for panel in row {
                let (fov_x, fov_y) = panel.fov;
                let height = if fov_x > 0.0 {
                    (self.image_width_px as f64 * fov_y / fov_x) as u32
                } else {
                    self.image_width_px
                };
                html.push_str(&format!(
                    "<div>\n<div id=\"aladin-lite-div-{index}\" style=\"width:{}px;height:{height}px;\"></div>\n<br>\n",
                    self.image_width_px
                ));
                html.push_str(&format!(
                    "<small>{} RA/DEC:{:.5}/{:.5}</small>\n</div>\n",
                    escape(&panel.label),
                    panel.ra_deg,
                    panel.dec_deg
                ));
                index += 1;
            }
            html.push_str("</div>\n");
        }

        for (index, panel) in panels.iter().enumerate() {
            html.push_str(&format!(
                "<script type=\"text/javascript\">\n    var aladin = A.aladin('#aladin-lite-div-{index}', \
                 {{survey: \"{}\", fov:{:.4}, target: \"{} {}\", showReticle:false, \
                 showZoomControl:false, showFullscreenControl:false, showLayersControl:false, \
                 showGotoControl:false}});\n</script>\n",
                self.survey, panel.fov.0, panel.ra_str, panel.dec_str
            ));
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render and write the page to `path`.
    pub fn write(&self, rows: &[Vec<MosaicPanel>], path: &Utf8Path) -> Result<(), AstroMosaicError> {
        fs::write(path, self.render(rows))?;
        info!("Mosaic images in file {path}");
        Ok(())
    }
}
