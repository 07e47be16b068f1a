//! `README.md` profile generation, for hosts that show a repository readme.

use crate::model::{Profile, SiteModel};

/// First line of every generated profile.
pub const PROFILE_HEADER: &str = "<!-- generated by blogsmith, do not edit -->";

/// Render the profile as markdown.
#[must_use]
pub fn render(model: &SiteModel, profile: &Profile) -> String {
    let mut out = format!("{PROFILE_HEADER}\n\n");

    match profile {
        Profile::Alternate(content) => out.push_str(content),
        Profile::Digest { title, posts, footer } => {
            if !title.is_empty() {
                out.push_str(&format!("{title}\n\n"));
            }
            for &i in posts {
                let node = &model.posts[i];
                out.push_str(&format!("- [{}]({})\n", node.post.title, node.permalink));
            }
            if let Some(footer) = footer {
                out.push_str(&format!("\n{footer}\n"));
            }
        }
    }

    out
}
