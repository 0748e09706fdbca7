#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub name: &'static str,
    pub filename: &'static str,
    pub source_code: &'static str,
}

macro_rules! make_example {
    ($name:literal) => {{
        Example {
            name: $name,
            filename: concat!($name, ".py"),
            source_code: include_str!(concat!("../snippets/", $name, ".py")),
        }
    }};
}

pub static EXAMPLES: [Example; 5] = [
    make_example!("hello"),
    make_example!("loops"),
    make_example!("errors"),
    make_example!("exit"),
    make_example!("files"),
];

pub fn names() -> Vec<&'static str> {
    EXAMPLES.iter().map(|example| example.name).collect()
}

pub fn find(name: &str) -> Option<&'static Example> {
    EXAMPLES.iter().find(|example| example.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_example_is_reachable_by_name() {
        for example in &EXAMPLES {
            assert_eq!(find(example.name), Some(example));
            assert!(!example.source_code.trim().is_empty());
        }
        assert_eq!(find("missing"), None);
    }
}
