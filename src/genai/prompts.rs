use crate::models::Background;

pub const CUTOUT_INSTRUCTION: &str = "Extract the person only from this image and remove the entire background, \
leaving a transparent background (alpha channel). Preserve the original silhouette and fine edges \
(hair, fingers), the pose, and the body proportions. Keep the full body visible from head to toe. \
Give the figure a more three-dimensional presence through volumetric contours, realistic lighting \
gradients, and subtle ambient occlusion, while keeping the original colors and clothing details. \
Output a high-resolution PNG.";

macro_rules! dress_directive {
    ($output:literal) => {
        concat!(
            "Dress the SINGLE person from the first image with ALL of the garment images that follow. ",
            "Produce exactly one figure: do not duplicate the person and do not add anyone else.\n",
            "Preserve identity exactly: the same face, facial features, expression, hair, skin tone, ",
            "body shape, proportions, and pose. Only the clothing changes.\n",
            "Clean each garment of anything that is not part of it (hands, legs, skin, background) before fitting it.\n",
            "Apply the garments in layering order from the body outward: above-waist items on the torso, ",
            "shoulders, and arms, then below-waist items on the hips, waist, and legs, then shoes on the feet, ",
            "then accessories such as bags, jewelry, and eyewear. Respect occlusion where layers overlap, ",
            "with natural draping and realistic fabric behavior.\n",
            "Keep the full body in frame from head to toe; do not crop any part of the figure.\n",
            "Unify lighting and shadow between the person and every garment, matching color temperature ",
            "and ambient light, and keep the figure's sculpted three-dimensional depth.\n",
            $output
        )
    };
}

pub const DRESS_BASE_DIRECTIVE: &str = dress_directive!(
    "Output a high-resolution PNG with a transparent background, or an opaque white background if transparency is not supported."
);

pub const DRESS_BASE_DIRECTIVE_WHITE: &str =
    dress_directive!("Output a high-resolution PNG on an opaque white background.");

pub fn base_directive(background: Background) -> &'static str {
    match background {
        Background::Transparent => DRESS_BASE_DIRECTIVE,
        Background::White => DRESS_BASE_DIRECTIVE_WHITE,
    }
}

/// Base directive, then the caller's addition after a blank line.
pub fn compose_instruction(base: &str, caller_prompt: Option<&str>) -> String {
    match caller_prompt {
        Some(prompt) if !prompt.trim().is_empty() => format!("{}\n\n{}", base, prompt),
        _ => base.to_string(),
    }
}

pub fn dress_instruction(background: Background, caller_prompt: Option<&str>) -> String {
    compose_instruction(base_directive(background), caller_prompt)
}
