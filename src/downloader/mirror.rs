//! URL prefix rewriting to derive mirror locations.
//!
//! Launchers commonly keep a table mapping official hosts to a mirror with
//! the same layout. A task that declares no mirrors of its own gets one
//! mirror URL per matching rule, in rule order.

use serde::{Deserialize, Serialize};

/// Rewrites URLs starting with `prefix` to start with `replacement` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub prefix: String,
    pub replacement: String,
}

impl MirrorRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// The mirrored URL, if the rule matches.
    pub fn apply(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.prefix)
            .map(|rest| format!("{}{}", self.replacement, rest))
    }

    /// Rules for the BMCLAPI mirror of Mojang, Forge and Fabric downloads.
    pub fn bmclapi() -> Vec<MirrorRule> {
        const BMCLAPI: &str = "https://bmclapi2.bangbang93.com";
        [
            ("https://piston-meta.mojang.com/", "/"),
            ("https://piston-data.mojang.com/", "/"),
            ("https://launchermeta.mojang.com/", "/"),
            ("https://launcher.mojang.com/", "/"),
            ("https://resources.download.minecraft.net/", "/assets/"),
            ("https://libraries.minecraft.net/", "/maven/"),
            ("https://maven.minecraftforge.net/", "/maven/"),
            ("https://files.minecraftforge.net/maven/", "/maven/"),
            ("https://maven.fabricmc.net/", "/maven/"),
        ]
        .into_iter()
        .map(|(prefix, path)| MirrorRule::new(prefix, format!("{}{}", BMCLAPI, path)))
        .collect()
    }
}

/// Mirror URLs for `url`, one per matching rule, without duplicates and
/// never `url` itself.
pub fn mirrors_for(rules: &[MirrorRule], url: &str) -> Vec<String> {
    let mut mirrors: Vec<String> = Vec::new();
    for mirrored in rules.iter().filter_map(|rule| rule.apply(url)) {
        if mirrored != url && !mirrors.contains(&mirrored) {
            mirrors.push(mirrored);
        }
    }
    mirrors
}
