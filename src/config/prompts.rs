//! Prompt templates and fixed replies for Vitrin.
//!
//! The defaults can be overridden by placing a `rag.toml` file in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates and canned replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// Behavioural instruction sent as the leading system message.
    pub system: String,
    /// Reply to a conversation opener, sent without retrieval or a model call.
    pub greeting_reply: String,
    /// Words that count as a greeting when they make up the whole question.
    pub greetings: Vec<String>,
    /// Reply when the backend call fails.
    pub apology: String,
    /// Reply when retrieval finds nothing and the model is not consulted.
    pub not_found: String,
    /// Reply when no backend could be initialized at startup.
    pub not_initialized: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: r#"تو یک دستیار هوشمند فروشگاه لوازم الکترونیکی هستی و فقط درباره محصولات همین فروشگاه صحبت می‌کنی.

قوانین:
- فقط از [اطلاعات محصولات] همراه پیام کاربر برای پاسخ استفاده کن و چیزی از خودت نساز.
- اگر اطلاعاتی همراه پیام نبود یا پاسخ در آن نبود، صادقانه بگو که اطلاعاتی درباره این محصول در دیتابیس پیدا نشد.
- به سوال‌هایی که به محصولات الکترونیکی ربطی ندارند، مؤدبانه پاسخ نده و بگو فقط درباره محصولات فروشگاه کمک می‌کنی.
- لحن تو دوستانه و محاوره‌ای باشد و پاسخ‌ها کوتاه و مستقیم.
- قیمت‌ها را به تومان و همان‌طور که در اطلاعات آمده بنویس."#
                .to_string(),
            greeting_reply: "سلام! من یک دستیار هوشمند محصولات هستم. چطور می‌توانم کمکتان کنم؟"
                .to_string(),
            greetings: ["سلام", "درود", "خوبی", "hello", "hi", "hey"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            apology: "متاسفانه در حال حاضر امکان پاسخ‌گویی وجود ندارد. لطفاً چند لحظه دیگر دوباره تلاش کنید."
                .to_string(),
            not_found: "متاسفانه اطلاعاتی در مورد این محصول در دیتابیس من پیدا نشد.".to_string(),
            not_initialized: "سرویس هوش مصنوعی راه‌اندازی نشده است. لطفاً تنظیمات سرور را بررسی کنید."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the defaults from `{custom_dir}/rag.toml` if present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                return Ok(toml::from_str(&content)?);
            }
        }

        Ok(Prompts::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.system.is_empty());
        assert!(prompts.greetings.iter().any(|g| g == "سلام"));
    }

    #[test]
    fn test_load_custom_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "greeting_reply = \"Hello! Ask me about our phones.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.greeting_reply, "Hello! Ask me about our phones.");
        assert_eq!(prompts.not_found, Prompts::default().not_found);
    }

    #[test]
    fn test_load_without_custom_dir() {
        let prompts = Prompts::load(None).unwrap();
        assert_eq!(prompts.apology, Prompts::default().apology);
    }
}
