//! Style to prompt mapping. Both functions are total and deterministic:
//! the same style always yields the same strings, with no randomness and
//! no seed handling.

/// Prompt sent upstream. The style appears twice, once naming the requested
/// style and once invoking the movement's characteristics, to bias the
/// model toward style-faithful output.
pub fn style_prompt(style: &str) -> String {
    format!(
        "Create a {style} style painting. The image should be highly detailed and artistic, \
         following the characteristics of {style} art movement."
    )
}

/// Prompt echoed back to the caller alongside the generated image.
pub fn echo_prompt(style: &str) -> String {
    format!("{style} style painting")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_prompt_embeds_the_style_twice() {
        let prompt = style_prompt("Impressionnisme");
        assert_eq!(prompt.matches("Impressionnisme").count(), 2);
        assert!(prompt.contains("Impressionnisme art movement"));
    }

    #[test]
    fn prompts_are_deterministic() {
        assert_eq!(style_prompt("Cubisme"), style_prompt("Cubisme"));
        assert_eq!(echo_prompt("Cubisme"), "Cubisme style painting");
    }
}
