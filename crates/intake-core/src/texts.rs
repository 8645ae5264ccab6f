//! Fixed message templates.
//!
//! Lines ending in two spaces are Markdown line breaks; keep them.

use crate::domain::UserId;

const WELCOME: &str = r#"✨ *Welcome to the Engine of Progress!* ✨  

Let's get to know each other better! Answer these 5 quick questions so we can help you effectively:  

1. **🛠 What do you do?**  
   (Tell us about your work, projects, or passions—what excites you?)  

2. **🎯 Why are you here?**  
   (What would you like to achieve? What help or advice are you looking for?)  

3. **📈 Where are you growing next?**  
   (What skills are you sharpening? Any big professional dreams?)  

4. **🌱 What's your current life chapter?**  
   (E.g., *"Launching a startup," "Career switch," "Exploring new horizons"*)  

5. **✏️ What's your name?**  
   (What should we call you?)  

Reply with numbered answers (1.-5.). Let's go! 🚀"#;

const RESPONSE: &str = r#"📬 *Thank you!* We've received your answers and will review them shortly.  

Expect a reply soon—make sure your DMs are open! 💌"#;

const ERROR: &str = "⚠️ Oops! Something went wrong. Please try again or contact support.";

const INVALID_FORMAT: &str = r#"❌ *Please use this format:*  

1. [Your work/passion]  
2. [Your goal]  
3. [Skills you're developing]  
4. [Current life phase]  
5. [Your name]  

Example:  
1. UX Designer & coffee enthusiast  
2. Need advice on freelancing  
3. Learning advanced prototyping  
4. Building my solo business  
5. Alex"#;

const RECEIVED_APPLICATION: &str = r#"📋 *New Application*  
──────  
**User ID:** `{user_id}`  
**Username:** @{username}  
**Name:** {full_name}  

**Responses:**  
{answers}  
──────  
✨ Forwarded to the team."#;

/// User-facing texts, owned by `Config`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texts {
    pub welcome: String,
    pub response: String,
    pub error: String,
    pub invalid_format: String,
    pub received_application: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            welcome: WELCOME.to_string(),
            response: RESPONSE.to_string(),
            error: ERROR.to_string(),
            invalid_format: INVALID_FORMAT.to_string(),
            received_application: RECEIVED_APPLICATION.to_string(),
        }
    }
}

impl Texts {
    /// Administrator report for one submission.
    pub fn application_report(
        &self,
        user_id: UserId,
        username: &str,
        full_name: &str,
        answers: &str,
    ) -> String {
        let user_id = user_id.to_string();
        render(
            &self.received_application,
            &[
                ("user_id", user_id.as_str()),
                ("username", username),
                ("full_name", full_name),
                ("answers", answers),
            ],
        )
    }
}

/// Fill `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are never scanned again, so user text containing
/// `{answers}` or stray braces comes through untouched. Unknown placeholders
/// are left as they are.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (close, *v))
        });

        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
