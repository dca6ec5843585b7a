//! Request handlers, grouped by domain the way the protocol groups its
//! opcodes. Every handler receives ids already in the client's own terms
//! and globalizes them through [`globalize`] before touching the
//! registry; replies localize ids back on the way out.

pub mod color;
pub mod drawing;
pub mod gcontext;
pub mod input;
pub mod misc;
pub mod property;
pub mod text;
pub mod window;
pub mod xinput;

use crate::protocol::errors::XError;
use crate::protocol::replies::Reply;
use crate::protocol::requests::Request;
use crate::protocol::types::*;
use crate::server::state::ServerState;

/// Zero, one, or (for ListFontsWithInfo) several replies.
pub type HandlerResult = Result<Vec<Reply>, XError>;

pub(crate) fn reply(reply: Reply) -> HandlerResult {
    Ok(vec![reply])
}

pub(crate) fn done() -> HandlerResult {
    Ok(Vec::new())
}

/// Map a client-relative id into the global namespace.
pub(crate) fn globalize(state: &ServerState, client: ClientId, id: XId) -> XId {
    state.clients.get(client).map(|c| c.globalize(id)).unwrap_or(id)
}

/// Map a global id back into the client's terms for a reply.
pub(crate) fn localize(state: &ServerState, client: ClientId, id: XId) -> XId {
    state.clients.get(client).map(|c| c.localize(id)).unwrap_or(id)
}

/// Route one decoded request to its handler.
pub fn handle_request(state: &mut ServerState, client: ClientId, request: Request) -> HandlerResult {
    use Request::*;
    match request {
        CreateWindow { .. }
        | ChangeWindowAttributes { .. }
        | GetWindowAttributes { .. }
        | DestroyWindow { .. }
        | DestroySubwindows { .. }
        | ChangeSaveSet { .. }
        | ReparentWindow { .. }
        | MapWindow { .. }
        | MapSubwindows { .. }
        | UnmapWindow { .. }
        | UnmapSubwindows { .. }
        | ConfigureWindow { .. }
        | CirculateWindow { .. }
        | GetGeometry { .. }
        | QueryTree { .. }
        | TranslateCoordinates { .. } => window::handle(state, client, request),

        InternAtom { .. }
        | GetAtomName { .. }
        | ChangeProperty { .. }
        | DeleteProperty { .. }
        | GetProperty { .. }
        | ListProperties { .. }
        | RotateProperties { .. }
        | SetSelectionOwner { .. }
        | GetSelectionOwner { .. }
        | ConvertSelection { .. } => property::handle(state, client, request),

        CreatePixmap { .. }
        | FreePixmap { .. }
        | CreateGC { .. }
        | ChangeGC { .. }
        | CopyGC { .. }
        | SetDashes { .. }
        | SetClipRectangles { .. }
        | FreeGC { .. }
        | QueryBestSize { .. } => gcontext::handle(state, client, request),

        ClearArea { .. }
        | CopyArea { .. }
        | CopyPlane { .. }
        | PolyPoint { .. }
        | PolyLine { .. }
        | PolySegment { .. }
        | PolyRectangle { .. }
        | PolyArc { .. }
        | FillPoly { .. }
        | PolyFillRectangle { .. }
        | PolyFillArc { .. }
        | PutImage { .. }
        | GetImage { .. } => drawing::handle(state, client, request),

        OpenFont { .. }
        | CloseFont { .. }
        | QueryFont { .. }
        | QueryTextExtents { .. }
        | ListFonts { .. }
        | ListFontsWithInfo { .. }
        | SetFontPath { .. }
        | GetFontPath { .. }
        | PolyText8 { .. }
        | PolyText16 { .. }
        | ImageText8 { .. }
        | ImageText16 { .. } => text::handle(state, client, request),

        CreateColormap { .. }
        | FreeColormap { .. }
        | CopyColormapAndFree { .. }
        | InstallColormap { .. }
        | UninstallColormap { .. }
        | ListInstalledColormaps { .. }
        | AllocColor { .. }
        | AllocNamedColor { .. }
        | AllocColorCells { .. }
        | AllocColorPlanes { .. }
        | FreeColors { .. }
        | StoreColors { .. }
        | StoreNamedColor { .. }
        | QueryColors { .. }
        | LookupColor { .. } => color::handle(state, client, request),

        SendEvent { .. }
        | GrabPointer { .. }
        | UngrabPointer { .. }
        | GrabButton { .. }
        | UngrabButton { .. }
        | ChangeActivePointerGrab { .. }
        | GrabKeyboard { .. }
        | UngrabKeyboard { .. }
        | GrabKey { .. }
        | UngrabKey { .. }
        | AllowEvents { .. }
        | QueryPointer { .. }
        | GetMotionEvents { .. }
        | WarpPointer { .. }
        | SetInputFocus { .. }
        | GetInputFocus
        | QueryKeymap => input::handle(state, client, request),

        XInput(inner) => xinput::handle(state, client, inner),

        CreateCursor { .. } | CreateGlyphCursor { .. } | FreeCursor { .. } | RecolorCursor { .. } => {
            misc::handle_cursor(state, client, request)
        }

        _ => misc::handle(state, client, request),
    }
}
