//! Skill registry and agent templates.

use crate::skill::SkillHandler;
use haus_core::{HausError, HausResult, SkillCategory, SkillDefinition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Central registry of skill definitions and their handlers.
///
/// Indexed by id and by upper-cased command tag at registration time, so both
/// lookups are O(1). Built once at startup and shared read-only.
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn SkillHandler>>,
    tags: HashMap<String, String>,
    order: Vec<String>,
    templates: HashMap<String, Vec<String>>,
}

impl SkillRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            skills: HashMap::new(),
            tags: HashMap::new(),
            order: Vec::new(),
            templates: HashMap::new(),
        }
    }

    /// Registers a handler. Ids and tags must be unique.
    pub fn register(&mut self, handler: Arc<dyn SkillHandler>) -> HausResult<()> {
        let def = handler.definition();
        let id = def.id.clone();
        let tag = def.command_tag.to_uppercase();

        if self.skills.contains_key(&id) {
            return Err(HausError::Config(format!("duplicate skill id '{id}'")));
        }
        if let Some(existing) = self.tags.get(&tag) {
            return Err(HausError::Config(format!(
                "command tag '{tag}' of '{id}' is already used by '{existing}'"
            )));
        }

        info!(skill = %id, tag = %tag, mutates = def.mutates_state, "Registered skill");
        self.tags.insert(tag, id.clone());
        self.order.push(id.clone());
        self.skills.insert(id, handler);
        Ok(())
    }

    /// Defines the fixed skill set of an agent template.
    pub fn define_template<I, S>(&mut self, template_id: &str, skill_ids: I) -> HausResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = skill_ids.into_iter().map(Into::into).collect();
        if let Some(unknown) = ids.iter().find(|id| !self.skills.contains_key(*id)) {
            return Err(HausError::Config(format!(
                "template '{template_id}' references unknown skill '{unknown}'"
            )));
        }
        self.templates.insert(template_id.to_string(), ids);
        Ok(())
    }

    /// Definition registered under `id`.
    pub fn get(&self, id: &str) -> Option<&SkillDefinition> {
        self.skills.get(id).map(|h| h.definition())
    }

    /// Handler registered under `id`.
    pub fn handler(&self, id: &str) -> Option<&Arc<dyn SkillHandler>> {
        self.skills.get(id)
    }

    /// Resolves a command tag case-insensitively.
    pub fn by_tag(&self, tag: &str) -> Option<&SkillDefinition> {
        self.tags
            .get(&tag.trim().to_uppercase())
            .and_then(|id| self.get(id))
    }

    /// All definitions in registration order.
    pub fn list_all(&self) -> Vec<&SkillDefinition> {
        self.order.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Definitions in one category, in registration order.
    pub fn list_by_category(&self, category: SkillCategory) -> Vec<&SkillDefinition> {
        self.list_all()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Definitions enabled for a template; empty for an unknown template.
    pub fn list_for_template(&self, template_id: &str) -> Vec<&SkillDefinition> {
        self.templates
            .get(template_id)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    /// Skill ids enabled by a template, or `None` if it is not defined.
    pub fn template_skill_ids(&self, template_id: &str) -> Option<HashSet<String>> {
        self.templates
            .get(template_id)
            .map(|ids| ids.iter().cloned().collect())
    }

    /// Defined template ids, sorted.
    pub fn template_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered skills.
    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    /// System prompt section describing the marker syntax and the given skills.
    pub fn prompt_instructions(skills: &[&SkillDefinition]) -> String {
        if skills.is_empty() {
            return String::new();
        }
        let mut out = String::from(
            "## Skills\n\
             You can take real actions by writing a command marker in your reply. \
             Markers use the form [[TAG|param1|param2]]. Each marker is replaced with \
             its result before the user sees your message. Only use the skills listed here.\n",
        );
        for def in skills {
            out.push_str(&format!("\n### {} ({})\n{}\n", def.name, def.category, def.description));
            out.push_str(&format!("Usage: {}\n", def.marker_syntax()));
            for param in &def.params {
                let req = if param.required { "required" } else { "optional" };
                out.push_str(&format!(
                    "- {} ({req}): {} e.g. {}\n",
                    param.name, param.description, param.example
                ));
            }
            for example in &def.examples {
                out.push_str(&format!(
                    "Example: user \"{}\" -> you \"{}\"\n",
                    example.input, example.output
                ));
            }
        }
        out
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}
