//! Scraping of the 189 login page.

use regex::Regex;

/// Hidden values the login form must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPage {
    pub lt: String,
    pub captcha_token: String,
    pub return_url: String,
    pub param_id: String,
    /// Base64 DER public key used to encrypt the credentials
    pub rsa_key: String,
}

impl LoginPage {
    pub fn scrape(html: &str) -> Result<Self, String> {
        Ok(Self {
            lt: capture(html, r#"lt = "(.+?)""#, "lt")?,
            captcha_token: capture(html, r"captchaToken' value='(.+?)'", "captchaToken")?,
            return_url: capture(html, r"returnUrl = '(.+?)'", "returnUrl")?,
            param_id: capture(html, r#"paramId = "(.+?)""#, "paramId")?,
            rsa_key: capture(html, r#"j_rsaKey" value="(\S+)""#, "j_rsaKey")?,
        })
    }
}

fn capture(html: &str, pattern: &str, field: &str) -> Result<String, String> {
    let re = Regex::new(pattern).map_err(|e| format!("bad pattern for {}: {}", field, e))?;
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| format!("login page is missing {}", field))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn login_html(rsa_key: &str) -> String {
        format!(
            r#"<script>
            var lt = "LT-123";
            var returnUrl = 'https://cloud.189.cn/callback';
            var paramId = "PARAM-9";
            </script>
            <input type='hidden' name='captchaToken' value='CAPTCHA-1'>
            <input type="hidden" id="j_rsaKey" value="{}">"#,
            rsa_key
        )
    }

    #[test]
    fn test_scrape_all_fields() {
        let page = LoginPage::scrape(&login_html("MIGfMA0G")).unwrap();

        assert_eq!(page.lt, "LT-123");
        assert_eq!(page.captcha_token, "CAPTCHA-1");
        assert_eq!(page.return_url, "https://cloud.189.cn/callback");
        assert_eq!(page.param_id, "PARAM-9");
        assert_eq!(page.rsa_key, "MIGfMA0G");
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = LoginPage::scrape("<html>maintenance</html>").unwrap_err();
        assert!(err.contains("lt"));
    }
}
