use crate::ScriptType;
use crate::error::Result;
use crate::compiler::Compiler;

/// Identity compiler for languages that need no transformation.
#[derive(Clone, Debug)]
pub struct PassThroughCompiler {
    name: String,
    types: [ScriptType; 1],
}

impl PassThroughCompiler {
    pub fn new(script_type: ScriptType) -> Self {
        Self { name: format!("passthrough:{script_type}"), types: [script_type] }
    }
}

impl Compiler for PassThroughCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_types(&self) -> &[ScriptType] {
        &self.types
    }

    fn compile(&self, input: &str) -> Result<String> {
        Ok(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let compiler = PassThroughCompiler::new(ScriptType::Js);
        assert_eq!(compiler.supported_types(), &[ScriptType::Js]);
        assert_eq!(compiler.compile("var a = 1;\n").unwrap(), "var a = 1;\n");
    }
}
