//! Shader Macro Definitions
//!
//! Geometries and graphics describe the shader features they need (present
//! attributes, morph target count, bone count) as an ordered set of
//! key/value macros. The program provider outside the core turns the set
//! into a compiled program; identical sets always compare and hash equal.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism::resources::ShaderDefines;
//!
//! let mut defines = ShaderDefines::new();
//! defines.set("HAS_NORMAL", "1");
//! defines.set("MORPHTARGETS", "4");
//! assert_eq!(defines.get("MORPHTARGETS"), Some("4"));
//! ```

/// A collection of shader macro definitions kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDefines {
    defines: Vec<(String, String)>,
}

impl ShaderDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { defines: Vec::new() }
    }

    /// Set shader define (maintains sorted order)
    ///
    /// If key exists, updates its value; otherwise inserts new entry.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.defines.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            Ok(idx) => value.clone_into(&mut self.defines[idx].1),
            Err(idx) => self.defines.insert(idx, (key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        if let Ok(idx) = self.defines.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            self.defines.remove(idx);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.defines
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.defines[idx].1.as_str())
    }

    /// Merge another set into this one; `other` wins on conflicting keys.
    pub fn merge(&mut self, other: &ShaderDefines) {
        for (k, v) in &other.defines {
            self.set(k, v);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defines.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ShaderDefines {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut defines = Self::new();
        for (k, v) in iter {
            defines.set(k, v);
        }
        defines
    }
}
