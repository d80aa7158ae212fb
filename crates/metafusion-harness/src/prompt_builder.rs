//! Text description of an image assembled from its prompt words.

use crate::codec::PromptType;

const STARTER: &str = "a";
const TRAILER: &str = "with clothes, dressed, upper bust, ultra realistic, 4k, frontal view";

/// Builder for the description of a created image. Every part is optional.
#[derive(Debug, Clone, Default)]
pub struct ImagePrompt {
    character: Option<String>,
    hat: Option<String>,
    tool: Option<String>,
    color: Option<String>,
    eyes: Option<String>,
    style: Option<String>,
}

impl ImagePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(mut self, word: impl Into<String>) -> Self {
        self.character = Some(word.into());
        self
    }

    pub fn hat(mut self, word: impl Into<String>) -> Self {
        self.hat = Some(word.into());
        self
    }

    pub fn tool(mut self, word: impl Into<String>) -> Self {
        self.tool = Some(word.into());
        self
    }

    pub fn color(mut self, word: impl Into<String>) -> Self {
        self.color = Some(word.into());
        self
    }

    pub fn eyes(mut self, word: impl Into<String>) -> Self {
        self.eyes = Some(word.into());
        self
    }

    pub fn style(mut self, word: impl Into<String>) -> Self {
        self.style = Some(word.into());
        self
    }

    /// Sets the part matching `prompt_type`.
    pub fn with(self, prompt_type: PromptType, word: impl Into<String>) -> Self {
        match prompt_type {
            PromptType::Character => self.character(word),
            PromptType::Hat => self.hat(word),
            PromptType::Tool => self.tool(word),
            PromptType::Color => self.color(word),
            PromptType::Eyes => self.eyes(word),
            PromptType::Style => self.style(word),
        }
    }

    pub fn build(&self) -> String {
        let mut prompt = String::from(STARTER);
        if let Some(character) = &self.character {
            prompt.push_str(&format!(" {character}"));
        }
        if let Some(hat) = &self.hat {
            prompt.push_str(&format!(" wearing a {hat} on the head"));
        }
        if let Some(color) = &self.color {
            prompt.push_str(&format!(", {color}"));
        }
        if let Some(tool) = &self.tool {
            prompt.push_str(&format!(", with a {tool} in hand"));
        }
        if let Some(eyes) = &self.eyes {
            prompt.push_str(&format!(", {eyes}"));
        }
        if let Some(style) = &self.style {
            prompt.push_str(&format!(", {style} style"));
        }
        prompt.push_str(&format!(", {TRAILER}"));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prompt() {
        let prompt = ImagePrompt::new()
            .character("cat")
            .hat("busby hat")
            .tool("magic wand")
            .color("blue and gold")
            .eyes("blindfold")
            .style("steampunk")
            .build();

        assert_eq!(
            prompt,
            "a cat wearing a busby hat on the head, blue and gold, with a magic wand in hand, \
             blindfold, steampunk style, with clothes, dressed, upper bust, ultra realistic, 4k, frontal view"
        );
    }

    #[test]
    fn test_missing_parts_are_skipped() {
        let prompt = ImagePrompt::new()
            .with(PromptType::Character, "dog")
            .with(PromptType::Style, "anime")
            .build();

        assert_eq!(prompt, format!("a dog, anime style, {TRAILER}"));
    }
}
