//! JavaScript minification with oxc.

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_mangler::MangleOptions;
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Size-only script minifier: compress, optionally mangle, print compactly.
///
/// Inputs are classic browser scripts, not modules: top-level functions and
/// variables are globals other scripts and inline handlers may use, so they
/// are neither dropped nor renamed.
#[derive(Debug, Clone, Copy)]
pub struct ScriptMinifier {
    mangle: bool,
}

impl ScriptMinifier {
    pub fn new(mangle: bool) -> Self {
        Self { mangle }
    }

    /// Minify one script. Returns the first parse error on failure.
    pub fn minify(&self, source: &str) -> Result<String, String> {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(false);
        let parsed = Parser::new(&allocator, source, source_type).parse();

        if let Some(error) = parsed.errors.first() {
            return Err(format!("JS parse error: {}", error));
        }

        let mut program = parsed.program;

        let options = MinifierOptions {
            mangle: self.mangle.then(|| MangleOptions {
                top_level: false,
                ..MangleOptions::default()
            }),
            compress: Some(CompressOptions::smallest()),
        };
        let minified = Minifier::new(options).minify(&allocator, &mut program);

        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(minified.scoping)
            .build(&program)
            .code;

        Ok(code)
    }
}

impl Default for ScriptMinifier {
    fn default() -> Self {
        Self::new(true)
    }
}
