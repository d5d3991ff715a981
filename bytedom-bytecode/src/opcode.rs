//! Opcode tag table shared between the program compiler and the runtime.
//!
//! The numeric tags are part of the wire format and must never be renumbered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction tags as they appear in a flat wire program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // Structure
    /// Open an element whose tag name follows as an operand
    ElementOpen = 1,
    /// Open a `div` element
    ElementOpenDiv = 2,
    /// Open a `span` element
    ElementOpenSpan = 3,
    /// Close the innermost open element
    ElementClose = 4,
    /// Open a fragment (an ordered run of sibling nodes)
    FragmentOpen = 5,
    /// Close the innermost open fragment
    FragmentClose = 6,

    // Control
    /// Choose one of two sub-programs from a test function
    Ternary = 7,
    /// Ternary whose test is read from a slot
    TernaryFromSlot = 8,
    /// Hand the current host node to a callback
    RefCallback = 9,
    /// Keyed map over a collection
    LoopMap = 10,
    /// Keyed map whose collection is read from a slot
    LoopMapFromSlot = 11,
    /// Store a computed value in a slot
    StoreSlotValue = 12,

    // Components
    /// Instantiate a component and mount its program
    ComponentInstance = 13,
    /// Component `shouldUpdate` hook
    ComponentLifecycleShouldUpdate = 14,
    /// Component `willMount` hook
    ComponentLifecycleWillMount = 15,
    /// Component `willUpdate` hook
    ComponentLifecycleWillUpdate = 16,
    /// Component `willReceiveProps` hook
    ComponentLifecycleWillReceiveProps = 17,
    /// Component `willUnmount` hook
    ComponentLifecycleWillUnmount = 18,
    /// Component `didMount` hook
    ComponentLifecycleDidMount = 19,
    /// Component `didUpdate` hook
    ComponentLifecycleDidUpdate = 20,
    /// Component `didCatch` hook
    ComponentLifecycleDidCatch = 21,

    // Properties
    /// Static CSS class
    PropertyStaticClassName = 22,
    /// Static element id
    PropertyStaticId = 23,
    /// Static inline style text
    PropertyStaticStyleCss = 24,
    /// Computed CSS class
    PropertyDynamicClassName = 25,
    /// CSS class read from props or a sibling slot
    PropertyDynamicClassNameFromSlot = 26,
    /// Computed element id
    PropertyDynamicId = 27,
    /// Element id read from props or a sibling slot
    PropertyDynamicIdFromSlot = 28,
    /// Computed inline style text
    PropertyDynamicStyleCss = 29,
    /// Inline style read from props or a sibling slot
    PropertyDynamicStyleCssFromSlot = 30,

    // Text
    /// Static text content of the open element
    TextStaticContent = 31,
    /// Computed text content of the open element
    TextDynamicContent = 32,
    /// Static text node child
    TextStaticNode = 33,
    /// Computed text node child
    TextDynamicNode = 34,
    /// Text node child read from props or a sibling slot
    TextDynamicNodeFromSlot = 35,

    // Attributes
    /// Static attribute name/value pair
    AttributeStatic = 36,
    /// Computed attribute value
    AttributeDynamic = 37,
    /// Attribute value read from props or a sibling slot
    AttributeDynamicFromSlot = 38,

    // Events
    /// Delegated listener registered once at mount
    EventStaticBound = 39,
    /// Delegated listener whose registration is refreshed on update
    EventDynamicBound = 40,
    /// Delegated listener read from a slot
    EventDynamicBoundFromSlot = 41,
}

impl Opcode {
    /// The wire tag for this opcode
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        use Opcode::*;
        let opcode = match tag {
            1 => ElementOpen,
            2 => ElementOpenDiv,
            3 => ElementOpenSpan,
            4 => ElementClose,
            5 => FragmentOpen,
            6 => FragmentClose,
            7 => Ternary,
            8 => TernaryFromSlot,
            9 => RefCallback,
            10 => LoopMap,
            11 => LoopMapFromSlot,
            12 => StoreSlotValue,
            13 => ComponentInstance,
            14 => ComponentLifecycleShouldUpdate,
            15 => ComponentLifecycleWillMount,
            16 => ComponentLifecycleWillUpdate,
            17 => ComponentLifecycleWillReceiveProps,
            18 => ComponentLifecycleWillUnmount,
            19 => ComponentLifecycleDidMount,
            20 => ComponentLifecycleDidUpdate,
            21 => ComponentLifecycleDidCatch,
            22 => PropertyStaticClassName,
            23 => PropertyStaticId,
            24 => PropertyStaticStyleCss,
            25 => PropertyDynamicClassName,
            26 => PropertyDynamicClassNameFromSlot,
            27 => PropertyDynamicId,
            28 => PropertyDynamicIdFromSlot,
            29 => PropertyDynamicStyleCss,
            30 => PropertyDynamicStyleCssFromSlot,
            31 => TextStaticContent,
            32 => TextDynamicContent,
            33 => TextStaticNode,
            34 => TextDynamicNode,
            35 => TextDynamicNodeFromSlot,
            36 => AttributeStatic,
            37 => AttributeDynamic,
            38 => AttributeDynamicFromSlot,
            39 => EventStaticBound,
            40 => EventDynamicBound,
            41 => EventDynamicBoundFromSlot,
            _ => return None,
        };
        Some(opcode)
    }

    /// Upper-case name used in diagnostics
    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            ElementOpen => "ELEMENT_OPEN",
            ElementOpenDiv => "ELEMENT_OPEN_DIV",
            ElementOpenSpan => "ELEMENT_OPEN_SPAN",
            ElementClose => "ELEMENT_CLOSE",
            FragmentOpen => "FRAGMENT_OPEN",
            FragmentClose => "FRAGMENT_CLOSE",
            Ternary => "TERNARY",
            TernaryFromSlot => "TERNARY_FROM_SLOT",
            RefCallback => "REF_CALLBACK",
            LoopMap => "LOOP_MAP",
            LoopMapFromSlot => "LOOP_MAP_FROM_SLOT",
            StoreSlotValue => "STORE_SLOT_VALUE",
            ComponentInstance => "COMPONENT_INSTANCE",
            ComponentLifecycleShouldUpdate => "COMPONENT_LIFECYCLE_SHOULD_UPDATE",
            ComponentLifecycleWillMount => "COMPONENT_LIFECYCLE_WILL_MOUNT",
            ComponentLifecycleWillUpdate => "COMPONENT_LIFECYCLE_WILL_UPDATE",
            ComponentLifecycleWillReceiveProps => "COMPONENT_LIFECYCLE_WILL_RECEIVE_PROPS",
            ComponentLifecycleWillUnmount => "COMPONENT_LIFECYCLE_WILL_UNMOUNT",
            ComponentLifecycleDidMount => "COMPONENT_LIFECYCLE_DID_MOUNT",
            ComponentLifecycleDidUpdate => "COMPONENT_LIFECYCLE_DID_UPDATE",
            ComponentLifecycleDidCatch => "COMPONENT_LIFECYCLE_DID_CATCH",
            PropertyStaticClassName => "PROPERTY_STATIC_CLASS_NAME",
            PropertyStaticId => "PROPERTY_STATIC_ID",
            PropertyStaticStyleCss => "PROPERTY_STATIC_STYLE_CSS",
            PropertyDynamicClassName => "PROPERTY_DYNAMIC_CLASS_NAME",
            PropertyDynamicClassNameFromSlot => "PROPERTY_DYNAMIC_CLASS_NAME_FROM_SLOT",
            PropertyDynamicId => "PROPERTY_DYNAMIC_ID",
            PropertyDynamicIdFromSlot => "PROPERTY_DYNAMIC_ID_FROM_SLOT",
            PropertyDynamicStyleCss => "PROPERTY_DYNAMIC_STYLE_CSS",
            PropertyDynamicStyleCssFromSlot => "PROPERTY_DYNAMIC_STYLE_CSS_FROM_SLOT",
            TextStaticContent => "TEXT_STATIC_CONTENT",
            TextDynamicContent => "TEXT_DYNAMIC_CONTENT",
            TextStaticNode => "TEXT_STATIC_NODE",
            TextDynamicNode => "TEXT_DYNAMIC_NODE",
            TextDynamicNodeFromSlot => "TEXT_DYNAMIC_NODE_FROM_SLOT",
            AttributeStatic => "ATTRIBUTE_STATIC",
            AttributeDynamic => "ATTRIBUTE_DYNAMIC",
            AttributeDynamicFromSlot => "ATTRIBUTE_DYNAMIC_FROM_SLOT",
            EventStaticBound => "EVENT_STATIC_BOUND",
            EventDynamicBound => "EVENT_DYNAMIC_BOUND",
            EventDynamicBoundFromSlot => "EVENT_DYNAMIC_BOUND_FROM_SLOT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Opcode::from_tag(tag).ok_or(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_wire_table() {
        assert_eq!(Opcode::ElementOpen.tag(), 1);
        assert_eq!(Opcode::LoopMap.tag(), 10);
        assert_eq!(Opcode::ComponentInstance.tag(), 13);
        assert_eq!(Opcode::TextDynamicContent.tag(), 32);
        assert_eq!(Opcode::EventDynamicBoundFromSlot.tag(), 41);
    }

    #[test]
    fn test_every_tag_resolves_to_itself() {
        for tag in 1..=41u8 {
            let opcode = Opcode::from_tag(tag).expect("tag in table");
            assert_eq!(opcode.tag(), tag);
        }
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(Opcode::from_tag(0), None);
        assert_eq!(Opcode::from_tag(42), None);
        assert_eq!(Opcode::try_from(200u8), Err(200));
    }

    #[test]
    fn test_display_uses_wire_name() {
        assert_eq!(Opcode::ElementOpenDiv.to_string(), "ELEMENT_OPEN_DIV");
        assert_eq!(Opcode::EventStaticBound.to_string(), "EVENT_STATIC_BOUND");
    }
}
