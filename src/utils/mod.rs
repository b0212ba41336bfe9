pub mod ip;
pub mod password;

use std::borrow::Cow;

/// alias 的最大长度
pub const MAX_ALIAS_LENGTH: usize = 64;

const ALIAS_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 生成随机 alias（字母 + 数字）
///
/// 唯一性不在这里保证，由数据库唯一索引在插入时判定。
pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    let length = length.clamp(4, 32);
    iter::repeat_with(|| ALIAS_CHARS[rand::random_range(0..ALIAS_CHARS.len())] as char)
        .take(length)
        .collect()
}

/// 与固定路由同名、不能作为 alias 的保留字
const RESERVED_ALIASES: &[&str] = &["api", "health", "shorten", "urls", "verify-password"];

/// alias 是否与固定路由冲突（不区分大小写）
pub fn is_reserved_alias(alias: &str) -> bool {
    RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
}

/// 生成随机密钥（十六进制，`bytes` 个随机字节）
pub fn generate_secure_token(bytes: usize) -> String {
    (0..bytes)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect()
}

/// 校验 alias 格式：1..=64 个字符，仅允许字母、数字、`_`、`-`
#[inline]
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias.len() <= MAX_ALIAS_LENGTH
        && alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// 从用户提交的值中取出 alias
///
/// 既接受裸 alias（`abc123`），也接受完整短链接（`https://host/abc123`），
/// 后者取最后一段非空路径，并去掉查询串和锚点。
pub fn extract_alias(input: &str) -> &str {
    let trimmed = input.trim();
    let Some((_, rest)) = trimmed.split_once("://") else {
        return trimmed;
    };

    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let path = rest.split_once('/').map(|(_, path)| path).unwrap_or("");
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

/// 把目标地址编码成合法的 `Location` 头
///
/// URL 中合法的字符原样保留，已有的 `%XX` 不重复编码；
/// 控制字符、空格和非 ASCII 字符按 UTF-8 字节百分号编码。
pub fn encode_location(target: &str) -> Cow<'_, str> {
    let is_escape = |i: usize| {
        let bytes = target.as_bytes();
        bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
    };
    let keep = |(i, c): (usize, char)| match c {
        '%' => is_escape(i),
        c => c.is_ascii_alphanumeric() || "!#$&'()*+,-./:;=?@[]_~".contains(c),
    };

    if target.char_indices().all(&keep) {
        return Cow::Borrowed(target);
    }

    let mut encoded = String::with_capacity(target.len() + 8);
    let mut buf = [0u8; 4];
    for (i, c) in target.char_indices() {
        if keep((i, c)) {
            encoded.push(c);
        } else {
            encoded.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    Cow::Owned(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code_length_and_charset() {
        let code = generate_random_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_random_code_clamps_length() {
        assert_eq!(generate_random_code(0).len(), 4);
        assert_eq!(generate_random_code(1000).len(), 32);
    }

    #[test]
    fn test_generated_codes_are_valid_aliases() {
        for _ in 0..50 {
            assert!(is_valid_alias(&generate_random_code(8)));
        }
    }

    #[test]
    fn test_is_valid_alias() {
        assert!(is_valid_alias("abc123"));
        assert!(is_valid_alias("my-link_1"));
        assert!(!is_valid_alias(""));
        assert!(!is_valid_alias("has space"));
        assert!(!is_valid_alias("a/b"));
        assert!(!is_valid_alias("favicon.ico"));
        assert!(!is_valid_alias(&"a".repeat(65)));
    }

    #[test]
    fn test_reserved_aliases() {
        assert!(is_reserved_alias("urls"));
        assert!(is_reserved_alias("Health"));
        assert!(!is_reserved_alias("abc123"));
    }

    #[test]
    fn test_generate_secure_token() {
        let token = generate_secure_token(32);
        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(token, generate_secure_token(32));
    }

    #[test]
    fn test_extract_alias_plain() {
        assert_eq!(extract_alias("abc123"), "abc123");
        assert_eq!(extract_alias("  abc123 "), "abc123");
    }

    #[test]
    fn test_extract_alias_from_full_url() {
        assert_eq!(extract_alias("https://s.example.com/abc123"), "abc123");
        assert_eq!(extract_alias("http://localhost:8080/abc123/"), "abc123");
        assert_eq!(extract_alias("https://s.example.com/abc123?x=1#top"), "abc123");
    }

    #[test]
    fn test_extract_alias_from_bare_host() {
        assert_eq!(extract_alias("http://localhost:8080"), "");
        assert_eq!(extract_alias("https://s.example.com"), "");
    }

    #[test]
    fn test_encode_location_keeps_ordinary_urls() {
        let url = "https://example.com/a/b?x=1&y=%20z#frag";
        assert!(matches!(encode_location(url), Cow::Borrowed(_)));
        assert_eq!(encode_location(url), url);
    }

    #[test]
    fn test_encode_location_escapes_unsafe_characters() {
        assert_eq!(
            encode_location("https://example.com/a\nb\r"),
            "https://example.com/a%0Ab%0D"
        );
        assert_eq!(encode_location("/a b\"c"), "/a%20b%22c");
        assert_eq!(encode_location("/caf\u{e9}"), "/caf%C3%A9");
        assert_eq!(encode_location("/100%"), "/100%25");
        assert_eq!(encode_location("/%zz"), "/%25zz");
    }
}
