//! System instruction construction from the owner profile
//!
//! The assistant may only state facts found in the profile: who the owner
//! is, their skills, their projects and how to reach them. The profile is
//! built in, or loaded from a JSON file named by `PORTFOLIO_PROFILE`.

use serde::Deserialize;
use std::fmt::Write;
use std::path::Path;
use thiserror::Error;

/// Persona and conduct rules appended after the owner facts
const PERSONALITY: &str = r#"Your personality: Futuristic, professional, concise, and helpful. Use space/tech metaphors occasionally (e.g., "Scanning database...", "Trajectory aligned").
Answer questions about {owner}'s background, skills, and contact info. If asked about something unrelated, politely steer back to {owner}'s portfolio."#;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid profile {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Facts about the portfolio owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub owner: String,
    pub headline: String,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
    #[serde(default)]
    pub contact: Vec<ContactChannel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillGroup {
    pub area: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectSummary {
    pub title: String,
    /// Listed without parentheses when empty
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactChannel {
    pub kind: String,
    pub value: String,
}

impl Profile {
    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ProfileError::Parse {
            path: display,
            source,
        })
    }

    /// The built-in profile, or the one named by `PORTFOLIO_PROFILE`
    pub fn from_env() -> Result<Self, ProfileError> {
        match std::env::var("PORTFOLIO_PROFILE") {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Seeded assistant message shown when the widget mounts
    pub fn greeting(&self) -> String {
        format!(
            "System Online. I am {}'s AI Assistant. How can I help you explore this universe?",
            self.owner
        )
    }
}

impl Default for Profile {
    fn default() -> Self {
        let group = |area: &str, skills: &[&str]| SkillGroup {
            area: area.to_string(),
            skills: skills.iter().map(|s| (*s).to_string()).collect(),
        };
        let project = |title: &str, summary: &str| ProjectSummary {
            title: title.to_string(),
            summary: summary.to_string(),
        };
        let channel = |kind: &str, value: &str| ContactChannel {
            kind: kind.to_string(),
            value: value.to_string(),
        };

        Self {
            owner: "Yash".to_string(),
            headline: "a skilled AI & Web Developer proficient in React, Three.js, Node.js, Python, and the MERN Stack".to_string(),
            skills: vec![
                group("Frontend", &["React", "Tailwind", "Three.js"]),
                group("Backend", &["Node", "SQL", "NoSQL"]),
                group("AI/ML", &["PyTorch", "Python"]),
            ],
            projects: vec![
                project("3D Portfolio Website", "Immersive, React Three Fiber"),
                project("AI Study Helper", "NLP, Flashcards"),
                project("Neon E-Commerce", ""),
            ],
            contact: vec![
                channel("Email", "codewithyash28@gmail.com"),
                channel("Phone", "7758844409"),
            ],
        }
    }
}

/// Build the fixed system instruction for a profile
pub fn build_system_prompt(profile: &Profile) -> String {
    let owner = &profile.owner;
    let mut prompt = format!(
        "You are an intelligent AI assistant for {owner}'s personal portfolio website.\n\
         {owner} is {}.\n\nKey Information:\n",
        profile.headline
    );

    if !profile.skills.is_empty() {
        let skills = profile
            .skills
            .iter()
            .map(|g| format!("{} ({})", g.area, g.skills.join(", ")))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "- Skills: {skills}.");
    }

    if !profile.projects.is_empty() {
        let projects = profile
            .projects
            .iter()
            .map(|p| {
                if p.summary.is_empty() {
                    format!("'{}'", p.title)
                } else {
                    format!("'{}' ({})", p.title, p.summary)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "- Projects: {projects}.");
    }

    if !profile.contact.is_empty() {
        let contact = profile
            .contact
            .iter()
            .map(|c| format!("{}: {}", c.kind, c.value))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "- Contact: {contact}.");
    }

    prompt.push('\n');
    prompt.push_str(&PERSONALITY.replace("{owner}", owner));
    prompt
}
