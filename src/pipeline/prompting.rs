const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Enhanced template used when reference images ride along with the prompt.
/// Pushes the provider through an analyze / plan / generate sequence before
/// it emits pixels.
const ENHANCED_WITH_IMAGES_TEMPLATE: &str = "\
Follow these steps in order before producing the image.
Step 1: Analyze each attached reference image and identify the visual \
features worth carrying over (subjects, style, palette, composition).
Step 2: Plan how those features integrate with the request below.
Step 3: Generate the image according to that plan.

Request: {prompt}";

/// Enhanced template for prompt-only requests.
const ENHANCED_NO_IMAGES_TEMPLATE: &str = "\
Follow these steps in order before producing the image.
Step 1: Make sure you fully understand the request below, including any \
implied style, mood and composition.
Step 2: Generate the image according to that understanding.

Request: {prompt}";

/// Selects and fills the enhanced-prompt template. Pure; with enhancement
/// disabled the prompt passes through untouched. Templates are fixed content
/// rather than caller configuration.
pub fn compose_prompt(prompt: &str, has_reference_images: bool, use_enhanced: bool) -> String {
    if !use_enhanced {
        return prompt.to_string();
    }
    let template = if has_reference_images {
        ENHANCED_WITH_IMAGES_TEMPLATE
    } else {
        ENHANCED_NO_IMAGES_TEMPLATE
    };
    template.replace(PROMPT_PLACEHOLDER, prompt)
}
