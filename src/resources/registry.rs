//! The process-wide resource registry.
//!
//! One map from 29-bit resource id to a typed resource. Handlers narrow
//! through the checked accessors, which produce the matching X error
//! (`Window`, `Pixmap`, `GContext`, …) on a miss or a type mismatch.
//! Ownership is indexed per client so disconnect can cascade-delete.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::color::colormap::ColormapRecord;
use crate::protocol::errors::XError;
use crate::protocol::types::*;
use crate::resources::cursor::CursorRecord;
use crate::resources::font::FontRecord;
use crate::resources::gcontext::GContext;
use crate::resources::pixmap::PixmapRecord;
use crate::window::tree::WindowNode;

#[derive(Debug, Clone)]
pub enum Resource {
    Window(Box<WindowNode>),
    Pixmap(PixmapRecord),
    GContext(Box<GContext>),
    Colormap(Box<ColormapRecord>),
    Cursor(CursorRecord),
    Font(FontRecord),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Window(_) => "window",
            Resource::Pixmap(_) => "pixmap",
            Resource::GContext(_) => "gcontext",
            Resource::Colormap(_) => "colormap",
            Resource::Cursor(_) => "cursor",
            Resource::Font(_) => "font",
        }
    }
}

/// A narrowed view of a drawable.
pub enum DrawableRef<'a> {
    Window(&'a WindowNode),
    Pixmap(&'a PixmapRecord),
}

impl DrawableRef<'_> {
    pub fn depth(&self) -> u8 {
        match self {
            DrawableRef::Window(window) => window.depth,
            DrawableRef::Pixmap(pixmap) => pixmap.depth,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        match self {
            DrawableRef::Window(window) => (window.width, window.height),
            DrawableRef::Pixmap(pixmap) => (pixmap.width, pixmap.height),
        }
    }
}

/// Per-kind live counts, used by teardown assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    pub windows: usize,
    pub pixmaps: usize,
    pub gcontexts: usize,
    pub colormaps: usize,
    pub cursors: usize,
    pub fonts: usize,
}

#[derive(Debug, Default)]
pub struct Registry {
    resources: HashMap<XId, Resource>,
    owners: HashMap<XId, ClientId>,
    owned: HashMap<ClientId, HashSet<XId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client-owned resource; an id already in use (in any
    /// type namespace) is an `IDChoice` error.
    pub fn insert(&mut self, client: ClientId, id: XId, resource: Resource) -> Result<(), XError> {
        if self.resources.contains_key(&id) {
            return Err(XError::id_choice(id));
        }
        debug!(client, id, kind = resource.kind(), "resource created");
        self.resources.insert(id, resource);
        self.owners.insert(id, client);
        self.owned.entry(client).or_default().insert(id);
        Ok(())
    }

    /// Insert a server-owned resource (root window, default colormap).
    pub fn insert_server(&mut self, id: XId, resource: Resource) {
        self.resources.insert(id, resource);
    }

    pub fn contains(&self, id: XId) -> bool {
        self.resources.contains_key(&id)
    }

    pub fn owner_of(&self, id: XId) -> Option<ClientId> {
        self.owners.get(&id).copied()
    }

    pub fn get(&self, id: XId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn window(&self, id: WindowId) -> Result<&WindowNode, XError> {
        match self.resources.get(&id) {
            Some(Resource::Window(window)) => Ok(window),
            _ => Err(XError::window(id)),
        }
    }

    pub fn window_mut(&mut self, id: WindowId) -> Result<&mut WindowNode, XError> {
        match self.resources.get_mut(&id) {
            Some(Resource::Window(window)) => Ok(window),
            _ => Err(XError::window(id)),
        }
    }

    pub fn pixmap(&self, id: PixmapId) -> Result<&PixmapRecord, XError> {
        match self.resources.get(&id) {
            Some(Resource::Pixmap(pixmap)) => Ok(pixmap),
            _ => Err(XError::pixmap(id)),
        }
    }

    pub fn gcontext(&self, id: GContextId) -> Result<&GContext, XError> {
        match self.resources.get(&id) {
            Some(Resource::GContext(gc)) => Ok(gc),
            _ => Err(XError::gcontext(id)),
        }
    }

    pub fn gcontext_mut(&mut self, id: GContextId) -> Result<&mut GContext, XError> {
        match self.resources.get_mut(&id) {
            Some(Resource::GContext(gc)) => Ok(gc),
            _ => Err(XError::gcontext(id)),
        }
    }

    pub fn colormap(&self, id: ColormapId) -> Result<&ColormapRecord, XError> {
        match self.resources.get(&id) {
            Some(Resource::Colormap(colormap)) => Ok(colormap),
            _ => Err(XError::colormap(id)),
        }
    }

    pub fn colormap_mut(&mut self, id: ColormapId) -> Result<&mut ColormapRecord, XError> {
        match self.resources.get_mut(&id) {
            Some(Resource::Colormap(colormap)) => Ok(colormap),
            _ => Err(XError::colormap(id)),
        }
    }

    pub fn cursor(&self, id: CursorId) -> Result<&CursorRecord, XError> {
        match self.resources.get(&id) {
            Some(Resource::Cursor(cursor)) => Ok(cursor),
            _ => Err(XError::cursor(id)),
        }
    }

    pub fn cursor_mut(&mut self, id: CursorId) -> Result<&mut CursorRecord, XError> {
        match self.resources.get_mut(&id) {
            Some(Resource::Cursor(cursor)) => Ok(cursor),
            _ => Err(XError::cursor(id)),
        }
    }

    pub fn font(&self, id: FontId) -> Result<&FontRecord, XError> {
        match self.resources.get(&id) {
            Some(Resource::Font(font)) => Ok(font),
            _ => Err(XError::font(id)),
        }
    }

    pub fn drawable(&self, id: DrawableId) -> Result<DrawableRef<'_>, XError> {
        match self.resources.get(&id) {
            Some(Resource::Window(window)) => Ok(DrawableRef::Window(window)),
            Some(Resource::Pixmap(pixmap)) => Ok(DrawableRef::Pixmap(pixmap)),
            _ => Err(XError::drawable(id)),
        }
    }

    /// Remove one resource, clearing the ownership index.
    pub fn remove(&mut self, id: XId) -> Option<Resource> {
        let resource = self.resources.remove(&id)?;
        if let Some(owner) = self.owners.remove(&id) {
            if let Some(set) = self.owned.get_mut(&owner) {
                set.remove(&id);
            }
        }
        debug!(id, kind = resource.kind(), "resource destroyed");
        Some(resource)
    }

    /// Ids of every live colormap, whoever owns it; disconnect uses this
    /// to release a client's cell allocations across all maps.
    pub fn colormap_ids(&self) -> Vec<ColormapId> {
        self.resources
            .iter()
            .filter(|(_, resource)| matches!(resource, Resource::Colormap(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Ids currently owned by `client`, in no particular order.
    pub fn ids_of(&self, client: ClientId) -> Vec<XId> {
        self.owned
            .get(&client)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Detach and return every id the client owns; the caller orders the
    /// actual destruction (windows deepest-first, then the rest).
    pub fn take_client_ids(&mut self, client: ClientId) -> Vec<XId> {
        self.owned
            .remove(&client)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn counts(&self) -> ResourceCounts {
        let mut counts = ResourceCounts::default();
        for resource in self.resources.values() {
            match resource {
                Resource::Window(_) => counts.windows += 1,
                Resource::Pixmap(_) => counts.pixmaps += 1,
                Resource::GContext(_) => counts.gcontexts += 1,
                Resource::Colormap(_) => counts.colormaps += 1,
                Resource::Cursor(_) => counts.cursors += 1,
                Resource::Font(_) => counts.fonts += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::errors::ErrorCode;

    fn pixmap(id: XId) -> Resource {
        Resource::Pixmap(PixmapRecord { id, width: 4, height: 4, depth: 24, origin_drawable: 1 })
    }

    #[test]
    fn duplicate_id_is_id_choice() {
        let mut registry = Registry::new();
        registry.insert(2, 0x0040_0001, pixmap(0x0040_0001)).unwrap();
        let err = registry.insert(2, 0x0040_0001, pixmap(0x0040_0001)).unwrap_err();
        assert_eq!(err.code, ErrorCode::IdChoice);
        // even across clients and types
        let err = registry
            .insert(3, 0x0040_0001, Resource::Font(FontRecord { id: 0x0040_0001, name: "fixed".into() }))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IdChoice);
    }

    #[test]
    fn narrowing_yields_typed_errors() {
        let mut registry = Registry::new();
        registry.insert(2, 10, pixmap(10)).unwrap();
        assert_eq!(registry.window(10).unwrap_err().code, ErrorCode::Window);
        assert_eq!(registry.gcontext(10).unwrap_err().code, ErrorCode::GContext);
        assert_eq!(registry.colormap(99).unwrap_err().code, ErrorCode::Colormap);
        assert!(registry.pixmap(10).is_ok());
        assert!(matches!(registry.drawable(10), Ok(DrawableRef::Pixmap(_))));
    }

    #[test]
    fn take_client_ids_detaches_ownership() {
        let mut registry = Registry::new();
        registry.insert(2, 10, pixmap(10)).unwrap();
        registry.insert(2, 11, pixmap(11)).unwrap();
        registry.insert(3, 12, pixmap(12)).unwrap();
        let mut ids = registry.take_client_ids(2);
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 11]);
        assert!(registry.ids_of(2).is_empty());
        // resources themselves are still present until destroyed
        assert!(registry.contains(10));
        for id in ids {
            registry.remove(id);
        }
        assert_eq!(registry.counts().pixmaps, 1);
    }

    #[test]
    fn server_resources_have_no_owner() {
        let mut registry = Registry::new();
        registry.insert_server(1, pixmap(1));
        assert_eq!(registry.owner_of(1), None);
        assert!(registry.contains(1));
    }
}
