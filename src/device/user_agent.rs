use serde::{Deserialize, Serialize};

const ANDROID_MAKERS: &[&str] = &[
    "Samsung", "Xiaomi", "Motorola", "LG", "Sony", "Huawei", "OnePlus", "Realme", "Oppo", "Vivo",
    "Nokia", "Lenovo",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceKind {
    pub name: String,
    pub brand: String,
}

impl DeviceKind {
    fn new(name: &str, brand: &str) -> Self {
        Self {
            name: name.to_string(),
            brand: brand.to_string(),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// Rough device name and brand from a browser user-agent string.
pub fn classify(user_agent: &str) -> DeviceKind {
    let ua = user_agent;
    if contains_ci(ua, "iPhone") {
        DeviceKind::new("iPhone", "Apple")
    } else if contains_ci(ua, "iPad") {
        DeviceKind::new("iPad", "Apple")
    } else if contains_ci(ua, "Android") {
        if ua.contains("Mobile") {
            let brand = ANDROID_MAKERS
                .iter()
                .find(|maker| contains_ci(ua, maker))
                .copied()
                .unwrap_or("Android");
            DeviceKind::new("Android Smartphone", brand)
        } else {
            DeviceKind::new("Android Tablet", "Android")
        }
    } else if contains_ci(ua, "Windows") {
        DeviceKind::new("Windows PC", "Microsoft")
    } else if contains_ci(ua, "Mac") {
        DeviceKind::new("Mac", "Apple")
    } else if contains_ci(ua, "Linux") {
        DeviceKind::new("Linux PC", "Linux")
    } else {
        DeviceKind::new("Unknown", "Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_agents() {
        let cases = [
            ("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)", "iPhone", "Apple"),
            ("Mozilla/5.0 (Linux; Android 14; SM-S911B) Mobile Safari Samsung", "Android Smartphone", "Samsung"),
            ("Mozilla/5.0 (Linux; Android 13; Pixel 7) Mobile", "Android Smartphone", "Android"),
            ("Mozilla/5.0 (Linux; Android 13; Tab) Safari", "Android Tablet", "Android"),
            ("Mozilla/5.0 (Windows NT 10.0; Win64; x64)", "Windows PC", "Microsoft"),
            ("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)", "Mac", "Apple"),
            ("Mozilla/5.0 (X11; Linux x86_64)", "Linux PC", "Linux"),
            ("curl/8.0", "Unknown", "Unknown"),
        ];
        for (ua, name, brand) in cases {
            assert_eq!(classify(ua), DeviceKind::new(name, brand), "{}", ua);
        }
    }
}
