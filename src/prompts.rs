pub const IMAGE_SYSTEM: &str = include_str!("../data/prompts/image_system.txt");
pub const OPTIMIZER_SYSTEM: &str = include_str!("../data/prompts/optimizer_system.txt");
pub const OPTIMIZER_USER: &str = include_str!("../data/prompts/optimizer_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result.trim_end().to_string()
}
