//! Fluent construction of wire programs.
//!
//! The builder only emits words; [`ProgramBuilder::build`] runs them through
//! the same decoder an externally generated program goes through.

use crate::binding::{Event, Key, Scope};
use crate::component::ComponentInstance;
use crate::error::Result;
use crate::instruction::SlotId;
use crate::opcode::Opcode;
use crate::program::Program;
use crate::word::Word;
use serde_json::Value;
use std::rc::Rc;

/// Source of a `*_FROM_SLOT` value
#[derive(Debug, Clone)]
pub enum SlotSource {
    /// A field of the current props
    Prop(String),
    /// An earlier value slot of the same program
    Slot(SlotId),
}

impl SlotSource {
    fn word(&self) -> Word {
        match self {
            SlotSource::Prop(name) => Word::str(name),
            SlotSource::Slot(slot) => Word::slot(*slot),
        }
    }
}

/// Loop operands beyond the collection, key and template
pub struct LoopOptions {
    props: Option<Word>,
    should_update: Option<Word>,
}

impl LoopOptions {
    pub fn new() -> Self {
        Self {
            props: None,
            should_update: None,
        }
    }

    pub fn with_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&Scope<'_>, &Value, usize) -> anyhow::Result<Value> + 'static,
    {
        self.props = Some(Word::Props(Rc::new(f)));
        self
    }

    pub fn with_should_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&Scope<'_>, &Value, &Value) -> bool + 'static,
    {
        self.should_update = Some(Word::ShouldUpdate(Rc::new(f)));
        self
    }
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for wire programs
#[derive(Default)]
pub struct ProgramBuilder {
    words: Vec<Word>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(mut self, opcode: Opcode, operands: impl IntoIterator<Item = Word>) -> Self {
        self.words.push(Word::op(opcode));
        self.words.extend(operands);
        self
    }

    /// Append a raw word
    pub fn word(mut self, word: Word) -> Self {
        self.words.push(word);
        self
    }

    // Structure

    /// Open an element. `div` and `span` use their dedicated opcodes.
    pub fn open(self, tag: &str) -> Self {
        match tag {
            "div" => self.open_div(),
            "span" => self.open_span(),
            _ => self.emit(Opcode::ElementOpen, [Word::str(tag)]),
        }
    }

    pub fn open_div(self) -> Self {
        self.emit(Opcode::ElementOpenDiv, [])
    }

    pub fn open_span(self) -> Self {
        self.emit(Opcode::ElementOpenSpan, [])
    }

    pub fn close(self) -> Self {
        self.emit(Opcode::ElementClose, [])
    }

    pub fn fragment(self) -> Self {
        self.emit(Opcode::FragmentOpen, [])
    }

    pub fn end_fragment(self) -> Self {
        self.emit(Opcode::FragmentClose, [])
    }

    // Static leaves

    pub fn class(self, value: &str) -> Self {
        self.emit(Opcode::PropertyStaticClassName, [Word::str(value)])
    }

    pub fn id(self, value: &str) -> Self {
        self.emit(Opcode::PropertyStaticId, [Word::str(value)])
    }

    pub fn style(self, value: &str) -> Self {
        self.emit(Opcode::PropertyStaticStyleCss, [Word::str(value)])
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.emit(Opcode::AttributeStatic, [Word::str(name), Word::str(value)])
    }

    /// Static text content of the open element
    pub fn text(self, value: &str) -> Self {
        self.emit(Opcode::TextStaticContent, [Word::str(value)])
    }

    /// Static text node child
    pub fn text_node(self, value: &str) -> Self {
        self.emit(Opcode::TextStaticNode, [Word::str(value)])
    }

    // Dynamic leaves

    pub fn dynamic_class<F>(self, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(Opcode::PropertyDynamicClassName, [compute(f), Word::slot(slot)])
    }

    pub fn dynamic_id<F>(self, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(Opcode::PropertyDynamicId, [compute(f), Word::slot(slot)])
    }

    pub fn dynamic_style<F>(self, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(Opcode::PropertyDynamicStyleCss, [compute(f), Word::slot(slot)])
    }

    pub fn dynamic_attr<F>(self, name: &str, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(
            Opcode::AttributeDynamic,
            [Word::str(name), compute(f), Word::slot(slot)],
        )
    }

    pub fn dynamic_text<F>(self, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(Opcode::TextDynamicContent, [compute(f), Word::slot(slot)])
    }

    pub fn dynamic_text_node<F>(self, f: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.emit(Opcode::TextDynamicNode, [compute(f), Word::slot(slot)])
    }

    pub fn class_from(self, source: SlotSource, slot: SlotId) -> Self {
        self.emit(
            Opcode::PropertyDynamicClassNameFromSlot,
            [source.word(), Word::slot(slot)],
        )
    }

    pub fn id_from(self, source: SlotSource, slot: SlotId) -> Self {
        self.emit(Opcode::PropertyDynamicIdFromSlot, [source.word(), Word::slot(slot)])
    }

    pub fn style_from(self, source: SlotSource, slot: SlotId) -> Self {
        self.emit(
            Opcode::PropertyDynamicStyleCssFromSlot,
            [source.word(), Word::slot(slot)],
        )
    }

    pub fn attr_from(self, name: &str, source: SlotSource, slot: SlotId) -> Self {
        self.emit(
            Opcode::AttributeDynamicFromSlot,
            [Word::str(name), source.word(), Word::slot(slot)],
        )
    }

    pub fn text_node_from(self, source: SlotSource, slot: SlotId) -> Self {
        self.emit(Opcode::TextDynamicNodeFromSlot, [source.word(), Word::slot(slot)])
    }

    // Control

    pub fn ternary<F>(
        self,
        test: F,
        slot: SlotId,
        consequent: ProgramBuilder,
        alternate: ProgramBuilder,
    ) -> Self
    where
        F: Fn(&Scope<'_>) -> anyhow::Result<bool> + 'static,
    {
        self.emit(
            Opcode::Ternary,
            [
                Word::Test(Rc::new(test)),
                Word::slot(slot),
                Word::Program(consequent.into_words()),
                Word::Program(alternate.into_words()),
            ],
        )
    }

    pub fn loop_map<C, K>(
        self,
        collection: C,
        slot: SlotId,
        key: K,
        options: LoopOptions,
        template: ProgramBuilder,
    ) -> Self
    where
        C: Fn(&Scope<'_>) -> anyhow::Result<Vec<Value>> + 'static,
        K: Fn(&Scope<'_>, &Value, usize) -> anyhow::Result<Key> + 'static,
    {
        self.emit(
            Opcode::LoopMap,
            [
                Word::Collection(Rc::new(collection)),
                Word::slot(slot),
                Word::Key(Rc::new(key)),
                options.props.unwrap_or(Word::Null),
                options.should_update.unwrap_or(Word::Null),
                Word::Program(template.into_words()),
            ],
        )
    }

    pub fn component<F>(self, factory: F, slot: SlotId, program: ProgramBuilder) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + 'static,
    {
        self.emit(
            Opcode::ComponentInstance,
            [
                Word::Factory(Rc::new(factory)),
                Word::slot(slot),
                Word::Program(program.into_words()),
            ],
        )
    }

    pub fn did_mount<F>(self, f: F) -> Self
    where
        F: Fn(Option<&ComponentInstance>) -> anyhow::Result<()> + 'static,
    {
        self.emit(Opcode::ComponentLifecycleDidMount, [Word::Lifecycle(Rc::new(f))])
    }

    pub fn did_update<F>(self, f: F) -> Self
    where
        F: Fn(Option<&ComponentInstance>) -> anyhow::Result<()> + 'static,
    {
        self.emit(Opcode::ComponentLifecycleDidUpdate, [Word::Lifecycle(Rc::new(f))])
    }

    // Events

    /// Delegated listener registered once at mount
    pub fn on<F>(self, event: &str, handler: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>, &Event) -> anyhow::Result<()> + 'static,
    {
        self.emit(
            Opcode::EventStaticBound,
            [Word::str(event), Word::Handler(Rc::new(handler)), Word::slot(slot)],
        )
    }

    /// Delegated listener whose props are refreshed on every update
    pub fn on_dynamic<F>(self, event: &str, handler: F, slot: SlotId) -> Self
    where
        F: Fn(&Scope<'_>, &Event) -> anyhow::Result<()> + 'static,
    {
        self.emit(
            Opcode::EventDynamicBound,
            [Word::str(event), Word::Handler(Rc::new(handler)), Word::slot(slot)],
        )
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    /// Decode the accumulated words
    pub fn build(self) -> Result<Program> {
        Program::decode(&self.words)
    }
}

fn compute<F>(f: F) -> Word
where
    F: Fn(&Scope<'_>) -> anyhow::Result<Value> + 'static,
{
    Word::Compute(Rc::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_specializes_div_and_span() {
        let words = ProgramBuilder::new()
            .open("div")
            .open("span")
            .open("table")
            .close()
            .close()
            .close()
            .into_words();
        assert!(matches!(words[0], Word::Op(2)));
        assert!(matches!(words[1], Word::Op(3)));
        assert!(matches!(words[2], Word::Op(1)));
        assert!(matches!(&words[3], Word::Str(tag) if &**tag == "table"));
    }

    #[test]
    fn test_loop_without_options_emits_nulls() {
        let words = ProgramBuilder::new()
            .loop_map(
                |_| Ok(vec![]),
                0,
                |_, item, _| Ok(Key::try_from(item)?),
                LoopOptions::new(),
                ProgramBuilder::new().open("li").close(),
            )
            .into_words();
        assert_eq!(words.len(), 7);
        assert!(matches!(words[4], Word::Null));
        assert!(matches!(words[5], Word::Null));
        assert!(matches!(&words[6], Word::Program(template) if template.len() == 3));
    }

    #[test]
    fn test_build_runs_the_decoder() {
        let program = ProgramBuilder::new()
            .open_div()
            .class("box")
            .dynamic_text(|scope| Ok(json!(scope.props()["label"].clone())), 0)
            .close()
            .build()
            .unwrap();
        assert_eq!(program.len(), 4);

        let err = ProgramBuilder::new().open_div().build().unwrap_err();
        assert!(matches!(err, crate::BytecodeError::Unclosed { .. }));
    }
}
