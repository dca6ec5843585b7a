//! The window tree: per-window state and arena-style tree walks.
//!
//! Windows reference each other strictly by id through the resource
//! registry; nothing here holds a shared pointer to another window, so
//! teardown is a post-order walk over ids. The `children` list of every
//! window is kept in stacking order, bottom first.

use std::collections::HashMap;

use crate::protocol::types::*;
use crate::resources::registry::Registry;
use crate::window::properties::PropertyStore;

/// One window in the tree.
#[derive(Debug, Clone)]
pub struct WindowNode {
    pub id: WindowId,
    /// `NONE` for the root window only.
    pub parent: WindowId,
    pub depth: u8,
    pub class: WindowClass,
    pub visual: VisualId,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub mapped: bool,
    pub override_redirect: bool,
    pub save_under: bool,
    pub background_pixel: Option<u32>,
    pub background_pixmap: Option<PixmapId>,
    pub border_pixel: Option<u32>,
    pub border_pixmap: Option<PixmapId>,
    pub bit_gravity: u8,
    pub win_gravity: u8,
    pub backing_store: u8,
    pub backing_planes: u32,
    pub backing_pixel: u32,
    pub colormap: ColormapId,
    pub cursor: CursorId,
    /// Bottom-to-top stacking order.
    pub children: Vec<WindowId>,
    /// Per-client event selections on this window.
    pub event_masks: HashMap<ClientId, EventMask>,
    pub do_not_propagate: EventMask,
    pub properties: PropertyStore,
}

impl WindowNode {
    pub fn new(
        id: WindowId,
        parent: WindowId,
        depth: u8,
        class: WindowClass,
        visual: VisualId,
        geometry: Rectangle,
        border_width: u16,
        colormap: ColormapId,
    ) -> Self {
        Self {
            id,
            parent,
            depth,
            class,
            visual,
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            border_width,
            mapped: false,
            override_redirect: false,
            save_under: false,
            background_pixel: None,
            background_pixmap: None,
            border_pixel: None,
            border_pixmap: None,
            bit_gravity: 0,
            win_gravity: 1,
            backing_store: 0,
            backing_planes: !0,
            backing_pixel: 0,
            colormap,
            cursor: NONE,
            children: Vec::new(),
            event_masks: HashMap::new(),
            do_not_propagate: EventMask::empty(),
            properties: PropertyStore::default(),
        }
    }

    pub fn geometry(&self) -> Rectangle {
        Rectangle { x: self.x, y: self.y, width: self.width, height: self.height }
    }

    /// Union of every client's selection on this window.
    pub fn all_event_masks(&self) -> EventMask {
        self.event_masks
            .values()
            .fold(EventMask::empty(), |acc, mask| acc | *mask)
    }

    /// Clients whose selection on this window intersects `mask`.
    pub fn selectors_of(&self, mask: EventMask) -> Vec<ClientId> {
        self.event_masks
            .iter()
            .filter(|(_, selected)| selected.intersects(mask))
            .map(|(client, _)| *client)
            .collect()
    }
}

/// The chain `[window, parent, …, root]`; stops cleanly if an id dangles.
pub fn ancestor_chain(registry: &Registry, window: WindowId) -> Vec<WindowId> {
    let mut chain = Vec::with_capacity(8);
    let mut current = window;
    while current != NONE {
        chain.push(current);
        match registry.window(current) {
            Ok(node) => current = node.parent,
            Err(_) => break,
        }
    }
    chain
}

pub fn is_ancestor(registry: &Registry, ancestor: WindowId, window: WindowId) -> bool {
    let mut current = window;
    while let Ok(node) = registry.window(current) {
        if node.parent == ancestor {
            return true;
        }
        if node.parent == NONE {
            return false;
        }
        current = node.parent;
    }
    false
}

/// Whether `window` and all its ancestors are mapped.
pub fn is_viewable(registry: &Registry, window: WindowId) -> bool {
    let mut current = window;
    while let Ok(node) = registry.window(current) {
        if !node.mapped {
            return false;
        }
        if node.parent == NONE {
            return true;
        }
        current = node.parent;
    }
    false
}

/// Root-relative origin of a window's interior.
pub fn root_origin(registry: &Registry, window: WindowId) -> (i32, i32) {
    let mut x = 0i32;
    let mut y = 0i32;
    let mut current = window;
    while let Ok(node) = registry.window(current) {
        x += node.x as i32;
        y += node.y as i32;
        if node.parent == NONE {
            break;
        }
        current = node.parent;
    }
    (x, y)
}

/// Map root coordinates into `window`'s coordinate space.
pub fn root_to_window(registry: &Registry, window: WindowId, root_x: i16, root_y: i16) -> (i16, i16) {
    let (ox, oy) = root_origin(registry, window);
    ((root_x as i32 - ox) as i16, (root_y as i32 - oy) as i16)
}

/// The topmost mapped child of `parent` containing the parent-relative
/// point, ignoring unmapped children.
pub fn child_at(registry: &Registry, parent: WindowId, x: i16, y: i16) -> Option<WindowId> {
    let node = registry.window(parent).ok()?;
    for &child in node.children.iter().rev() {
        if let Ok(candidate) = registry.window(child) {
            if candidate.mapped && candidate.geometry().contains(x, y) {
                return Some(child);
            }
        }
    }
    None
}

/// Deepest mapped window under the root-relative point, walking the
/// stacking order top-down. Falls back to `root` itself.
pub fn hit_test(registry: &Registry, root: WindowId, root_x: i16, root_y: i16) -> WindowId {
    let mut current = root;
    let mut x = root_x;
    let mut y = root_y;
    while let Some(child) = child_at(registry, current, x, y) {
        let node = match registry.window(child) {
            Ok(node) => node,
            Err(_) => break,
        };
        x -= node.x;
        y -= node.y;
        current = child;
    }
    current
}

/// All descendants of `window`, deepest first, suitable as a destruction
/// order. `window` itself is not included.
pub fn descendants_post_order(registry: &Registry, window: WindowId) -> Vec<WindowId> {
    fn visit(registry: &Registry, window: WindowId, out: &mut Vec<WindowId>) {
        if let Ok(node) = registry.window(window) {
            let children = node.children.clone();
            for child in children {
                visit(registry, child, out);
                out.push(child);
            }
        }
    }
    let mut out = Vec::new();
    visit(registry, window, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::registry::{Registry, Resource};

    const ROOT: WindowId = 0x0020_0001;
    const CLIENT: ClientId = 2;

    fn make_window(id: WindowId, parent: WindowId, rect: Rectangle) -> WindowNode {
        let mut node = WindowNode::new(
            id,
            parent,
            24,
            WindowClass::InputOutput,
            1,
            rect,
            0,
            0x0020_0002,
        );
        node.mapped = true;
        node
    }

    fn tree() -> Registry {
        let mut registry = Registry::new();
        let mut root = make_window(
            ROOT,
            NONE,
            Rectangle { x: 0, y: 0, width: 1280, height: 800 },
        );
        root.children = vec![10, 20];
        registry.insert_server(ROOT, Resource::Window(Box::new(root)));

        let mut child_low = make_window(10, ROOT, Rectangle { x: 0, y: 0, width: 600, height: 600 });
        child_low.children = vec![11];
        registry.insert_server(10, Resource::Window(Box::new(child_low)));

        let grandchild =
            make_window(11, 10, Rectangle { x: 50, y: 50, width: 100, height: 100 });
        registry.insert_server(11, Resource::Window(Box::new(grandchild)));

        let child_high =
            make_window(20, ROOT, Rectangle { x: 500, y: 0, width: 600, height: 600 });
        registry.insert_server(20, Resource::Window(Box::new(child_high)));
        registry
    }

    #[test]
    fn ancestor_chain_reaches_root() {
        let registry = tree();
        assert_eq!(ancestor_chain(&registry, 11), vec![11, 10, ROOT]);
    }

    #[test]
    fn hit_test_honours_stacking() {
        let registry = tree();
        // (550, 100) is inside both children; 20 is on top.
        assert_eq!(hit_test(&registry, ROOT, 550, 100), 20);
        // (60, 60) descends into the grandchild.
        assert_eq!(hit_test(&registry, ROOT, 60, 60), 11);
        // Empty space falls back to the root.
        assert_eq!(hit_test(&registry, ROOT, 10, 700), 10);
    }

    #[test]
    fn unmapped_windows_are_invisible_to_hit_test() {
        let mut registry = tree();
        registry.window_mut(20).unwrap().mapped = false;
        assert_eq!(hit_test(&registry, ROOT, 550, 100), 10);
    }

    #[test]
    fn root_origin_accumulates_offsets() {
        let registry = tree();
        assert_eq!(root_origin(&registry, 11), (50, 50));
        assert_eq!(root_to_window(&registry, 11, 60, 65), (10, 15));
    }

    #[test]
    fn viewability_requires_mapped_ancestors() {
        let mut registry = tree();
        assert!(is_viewable(&registry, 11));
        registry.window_mut(10).unwrap().mapped = false;
        assert!(!is_viewable(&registry, 11));
    }

    #[test]
    fn destruction_order_is_deepest_first() {
        let registry = tree();
        assert_eq!(descendants_post_order(&registry, ROOT), vec![11, 10, 20]);
    }

    #[test]
    fn selectors_and_mask_union() {
        let mut registry = tree();
        let node = registry.window_mut(10).unwrap();
        node.event_masks.insert(CLIENT, EventMask::KEY_PRESS | EventMask::EXPOSURE);
        node.event_masks.insert(3, EventMask::BUTTON_PRESS);
        assert_eq!(
            node.all_event_masks(),
            EventMask::KEY_PRESS | EventMask::EXPOSURE | EventMask::BUTTON_PRESS
        );
        assert_eq!(node.selectors_of(EventMask::KEY_PRESS), vec![CLIENT]);
    }
}
