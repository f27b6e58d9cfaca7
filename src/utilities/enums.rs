use std::fmt;
use std::str::FromStr;

/// Which engine sits behind a [`TaLibrary`](crate::TaLibrary).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
	Auto,
	Reference,
	TaLib,
}

impl Default for Backend {
	fn default() -> Self {
		Backend::Auto
	}
}

impl Backend {
	#[inline(always)]
	pub const fn is_native(self) -> bool {
		matches!(self, Backend::TaLib)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Backend::Auto => "auto",
			Backend::Reference => "reference",
			Backend::TaLib => "ta-lib",
		}
	}
}

impl FromStr for Backend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"" | "auto" => Ok(Backend::Auto),
			"reference" | "ref" => Ok(Backend::Reference),
			"ta-lib" | "talib" | "ta_lib" | "native" => Ok(Backend::TaLib),
			other => Err(format!("unknown backend '{other}' (expected auto, reference or ta-lib)")),
		}
	}
}

impl fmt::Display for Backend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_backend_parse() {
		assert_eq!("".parse::<Backend>(), Ok(Backend::Auto));
		assert_eq!("Reference".parse::<Backend>(), Ok(Backend::Reference));
		assert_eq!("talib".parse::<Backend>(), Ok(Backend::TaLib));
		assert!("cuda".parse::<Backend>().is_err());
		assert_eq!(Backend::default(), Backend::Auto);
		assert!(Backend::TaLib.is_native());
	}
}
