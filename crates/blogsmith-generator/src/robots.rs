//! Robots.txt generation.

use tracing::debug;

use crate::model::Robots;

/// Render `robots.txt`: one block per agent, then the sitemap line.
#[must_use]
pub fn render(robots: &Robots) -> String {
    debug!(agents = robots.agents.len(), "generating robots.txt");

    let mut out = String::from("# generated by blogsmith, do not edit\n\n");

    for agent in &robots.agents {
        for name in &agent.agent {
            out.push_str(&format!("User-agent: {name}\n"));
        }
        for path in &agent.disallow {
            out.push_str(&format!("Disallow: {path}\n"));
        }
        for path in &agent.allow {
            out.push_str(&format!("Allow: {path}\n"));
        }
        out.push('\n');
    }

    if let Some(sitemap) = &robots.sitemap {
        out.push_str(&format!("Sitemap: {sitemap}\n"));
    }

    out
}
