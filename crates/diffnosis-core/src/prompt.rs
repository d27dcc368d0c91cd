use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::RelayError;
use crate::profile::UserProfile;

/// Append the user's profile to their symptom description.
///
/// Every field is written even when empty, always in the same order.
pub fn build_symptom_prompt(user_text: &str, profile: &UserProfile) -> String {
    let mut prompt = String::new();

    prompt.push_str(user_text);
    prompt.push_str(" \n\n");
    prompt.push_str("Here is the user's information:\n");
    prompt.push_str(&format!("Name: {}\n", profile.name));
    prompt.push_str(&format!("Age: {}\n", profile.age));
    prompt.push_str(&format!("Email: {}\n", profile.email));
    prompt.push_str(&format!("Height: {} cm\n", profile.height));
    prompt.push_str(&format!("Weight: {} kg\n", profile.weight));
    prompt.push_str(&format!("Sex: {}", profile.sex));

    prompt
}

/// Embed an image as a base64 data URI inside the image-analysis instructions.
pub fn build_image_prompt(image: &[u8]) -> Result<String, RelayError> {
    if image.is_empty() {
        return Err(RelayError::EmptyImage);
    }

    let data_uri = format!("data:{};base64,{}", image_mime(image), BASE64.encode(image));

    Ok(format!(
        "I have analyzed an image. Here is the Base64 encoding: {}. \
         Please provide a detailed analysis and expected insights based on this data. \
         Limit your response to 50 words, and do not include disclaimers like \
         'I am not a medical professional.'",
        data_uri
    ))
}

/// Guess the media type from magic bytes. Phone cameras mostly produce JPEG,
/// so that is the fallback.
fn image_mime(image: &[u8]) -> &'static str {
    if image.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if image.starts_with(b"GIF87a") || image.starts_with(b"GIF89a") {
        "image/gif"
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Sex;

    fn alice() -> UserProfile {
        UserProfile {
            name: "Alice".into(),
            age: "30".into(),
            email: "a@example.com".into(),
            height: "170".into(),
            weight: "60".into(),
            sex: Sex::Female,
            photo: None,
        }
    }

    fn extract_payload(prompt: &str) -> &str {
        let start = prompt.find(";base64,").unwrap() + ";base64,".len();
        let rest = &prompt[start..];
        let end = rest.find(". Please").unwrap();
        &rest[..end]
    }

    #[test]
    fn test_symptom_prompt_layout() {
        let prompt = build_symptom_prompt("I have a headache", &alice());
        assert_eq!(
            prompt,
            "I have a headache \n\n\
             Here is the user's information:\n\
             Name: Alice\n\
             Age: 30\n\
             Email: a@example.com\n\
             Height: 170 cm\n\
             Weight: 60 kg\n\
             Sex: Female"
        );
    }

    #[test]
    fn test_symptom_prompt_with_empty_profile() {
        let prompt = build_symptom_prompt("sore throat", &UserProfile::new());
        assert!(prompt.starts_with("sore throat"));

        let labels = ["Name: ", "Age: ", "Email: ", "Height:  cm", "Weight:  kg", "Sex: Male"];
        let mut last = 0;
        for label in labels {
            let pos = prompt[last..].find(label).map(|p| p + last);
            assert!(pos.is_some(), "missing {label:?} in order");
            last = pos.unwrap();
        }
    }

    #[test]
    fn test_symptom_prompt_is_deterministic() {
        assert_eq!(
            build_symptom_prompt("cough", &alice()),
            build_symptom_prompt("cough", &alice())
        );
    }

    #[test]
    fn test_image_prompt_embeds_exact_bytes() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let prompt = build_image_prompt(&bytes).unwrap();

        let decoded = BASE64.decode(extract_payload(&prompt)).unwrap();
        assert_eq!(decoded, bytes);
        assert!(prompt.contains("data:image/jpeg;base64,"));
        assert!(prompt.contains("Limit your response to 50 words"));
        assert!(prompt.contains("'I am not a medical professional.'"));
    }

    #[test]
    fn test_image_prompt_sniffs_png() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let prompt = build_image_prompt(png).unwrap();
        assert!(prompt.contains("data:image/png;base64,"));
        assert_eq!(BASE64.decode(extract_payload(&prompt)).unwrap(), png);
    }

    #[test]
    fn test_image_prompt_rejects_empty_bytes() {
        assert!(matches!(build_image_prompt(&[]), Err(RelayError::EmptyImage)));
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(b"GIF89a...."), "image/gif");
        assert_eq!(image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(image_mime(&[0xFF, 0xD8, 0xFF]), "image/jpeg");
        assert_eq!(image_mime(b"RIFF"), "image/jpeg");
    }
}
