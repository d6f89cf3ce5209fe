/// Settings shared by the library reader, the worksheet loader and the transformation search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
	/// Type code of provable statements, `|-` in set.mm.
	pub provable_type: String,
	/// Syntax type the provable type code stands for, `wff` in set.mm.
	pub logic_type: String,
	/// Work variable name prefix and the type code of the variables it allocates.
	pub work_var_prefixes: Vec<(String, String)>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			provable_type: "|-".to_string(),
			logic_type: "wff".to_string(),
			work_var_prefixes: vec![
				("&W".to_string(), "wff".to_string()),
				("&C".to_string(), "class".to_string()),
				("&S".to_string(), "setvar".to_string()),
			],
		}
	}
}

impl Config {
	pub fn with_types(provable_type: &str, logic_type: &str) -> Self {
		Config {
			provable_type: provable_type.to_string(),
			logic_type: logic_type.to_string(),
			..Config::default()
		}
	}
}
