use anyhow::Result;
use serde_json::Value;

/// Cast a string with the type caster and print the result as JSON
pub fn run(type_name: &str, value: &str) -> Result<()> {
    let cast = declarative::cast(type_name, &Value::String(value.to_string()))?;
    println!("{}", cast);
    Ok(())
}
