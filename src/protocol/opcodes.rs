//! Request opcode constants for the core protocol and the XInput extension.

pub const CREATE_WINDOW: u8 = 1;
pub const CHANGE_WINDOW_ATTRIBUTES: u8 = 2;
pub const GET_WINDOW_ATTRIBUTES: u8 = 3;
pub const DESTROY_WINDOW: u8 = 4;
pub const DESTROY_SUBWINDOWS: u8 = 5;
pub const CHANGE_SAVE_SET: u8 = 6;
pub const REPARENT_WINDOW: u8 = 7;
pub const MAP_WINDOW: u8 = 8;
pub const MAP_SUBWINDOWS: u8 = 9;
pub const UNMAP_WINDOW: u8 = 10;
pub const UNMAP_SUBWINDOWS: u8 = 11;
pub const CONFIGURE_WINDOW: u8 = 12;
pub const CIRCULATE_WINDOW: u8 = 13;
pub const GET_GEOMETRY: u8 = 14;
pub const QUERY_TREE: u8 = 15;
pub const INTERN_ATOM: u8 = 16;
pub const GET_ATOM_NAME: u8 = 17;
pub const CHANGE_PROPERTY: u8 = 18;
pub const DELETE_PROPERTY: u8 = 19;
pub const GET_PROPERTY: u8 = 20;
pub const LIST_PROPERTIES: u8 = 21;
pub const SET_SELECTION_OWNER: u8 = 22;
pub const GET_SELECTION_OWNER: u8 = 23;
pub const CONVERT_SELECTION: u8 = 24;
pub const SEND_EVENT: u8 = 25;
pub const GRAB_POINTER: u8 = 26;
pub const UNGRAB_POINTER: u8 = 27;
pub const GRAB_BUTTON: u8 = 28;
pub const UNGRAB_BUTTON: u8 = 29;
pub const CHANGE_ACTIVE_POINTER_GRAB: u8 = 30;
pub const GRAB_KEYBOARD: u8 = 31;
pub const UNGRAB_KEYBOARD: u8 = 32;
pub const GRAB_KEY: u8 = 33;
pub const UNGRAB_KEY: u8 = 34;
pub const ALLOW_EVENTS: u8 = 35;
pub const GRAB_SERVER: u8 = 36;
pub const UNGRAB_SERVER: u8 = 37;
pub const QUERY_POINTER: u8 = 38;
pub const GET_MOTION_EVENTS: u8 = 39;
pub const TRANSLATE_COORDINATES: u8 = 40;
pub const WARP_POINTER: u8 = 41;
pub const SET_INPUT_FOCUS: u8 = 42;
pub const GET_INPUT_FOCUS: u8 = 43;
pub const QUERY_KEYMAP: u8 = 44;
pub const OPEN_FONT: u8 = 45;
pub const CLOSE_FONT: u8 = 46;
pub const QUERY_FONT: u8 = 47;
pub const QUERY_TEXT_EXTENTS: u8 = 48;
pub const LIST_FONTS: u8 = 49;
pub const LIST_FONTS_WITH_INFO: u8 = 50;
pub const SET_FONT_PATH: u8 = 51;
pub const GET_FONT_PATH: u8 = 52;
pub const CREATE_PIXMAP: u8 = 53;
pub const FREE_PIXMAP: u8 = 54;
pub const CREATE_GC: u8 = 55;
pub const CHANGE_GC: u8 = 56;
pub const COPY_GC: u8 = 57;
pub const SET_DASHES: u8 = 58;
pub const SET_CLIP_RECTANGLES: u8 = 59;
pub const FREE_GC: u8 = 60;
pub const CLEAR_AREA: u8 = 61;
pub const COPY_AREA: u8 = 62;
pub const COPY_PLANE: u8 = 63;
pub const POLY_POINT: u8 = 64;
pub const POLY_LINE: u8 = 65;
pub const POLY_SEGMENT: u8 = 66;
pub const POLY_RECTANGLE: u8 = 67;
pub const POLY_ARC: u8 = 68;
pub const FILL_POLY: u8 = 69;
pub const POLY_FILL_RECTANGLE: u8 = 70;
pub const POLY_FILL_ARC: u8 = 71;
pub const PUT_IMAGE: u8 = 72;
pub const GET_IMAGE: u8 = 73;
pub const POLY_TEXT8: u8 = 74;
pub const POLY_TEXT16: u8 = 75;
pub const IMAGE_TEXT8: u8 = 76;
pub const IMAGE_TEXT16: u8 = 77;
pub const CREATE_COLORMAP: u8 = 78;
pub const FREE_COLORMAP: u8 = 79;
pub const COPY_COLORMAP_AND_FREE: u8 = 80;
pub const INSTALL_COLORMAP: u8 = 81;
pub const UNINSTALL_COLORMAP: u8 = 82;
pub const LIST_INSTALLED_COLORMAPS: u8 = 83;
pub const ALLOC_COLOR: u8 = 84;
pub const ALLOC_NAMED_COLOR: u8 = 85;
pub const ALLOC_COLOR_CELLS: u8 = 86;
pub const ALLOC_COLOR_PLANES: u8 = 87;
pub const FREE_COLORS: u8 = 88;
pub const STORE_COLORS: u8 = 89;
pub const STORE_NAMED_COLOR: u8 = 90;
pub const QUERY_COLORS: u8 = 91;
pub const LOOKUP_COLOR: u8 = 92;
pub const CREATE_CURSOR: u8 = 93;
pub const CREATE_GLYPH_CURSOR: u8 = 94;
pub const FREE_CURSOR: u8 = 95;
pub const RECOLOR_CURSOR: u8 = 96;
pub const QUERY_BEST_SIZE: u8 = 97;
pub const QUERY_EXTENSION: u8 = 98;
pub const LIST_EXTENSIONS: u8 = 99;
pub const CHANGE_KEYBOARD_MAPPING: u8 = 100;
pub const GET_KEYBOARD_MAPPING: u8 = 101;
pub const CHANGE_KEYBOARD_CONTROL: u8 = 102;
pub const GET_KEYBOARD_CONTROL: u8 = 103;
pub const BELL: u8 = 104;
pub const CHANGE_POINTER_CONTROL: u8 = 105;
pub const GET_POINTER_CONTROL: u8 = 106;
pub const SET_SCREEN_SAVER: u8 = 107;
pub const GET_SCREEN_SAVER: u8 = 108;
pub const CHANGE_HOSTS: u8 = 109;
pub const LIST_HOSTS: u8 = 110;
pub const SET_ACCESS_CONTROL: u8 = 111;
pub const SET_CLOSE_DOWN_MODE: u8 = 112;
pub const KILL_CLIENT: u8 = 113;
pub const ROTATE_PROPERTIES: u8 = 114;
pub const FORCE_SCREEN_SAVER: u8 = 115;
pub const SET_POINTER_MAPPING: u8 = 116;
pub const GET_POINTER_MAPPING: u8 = 117;
pub const SET_MODIFIER_MAPPING: u8 = 118;
pub const GET_MODIFIER_MAPPING: u8 = 119;
pub const NO_OPERATION: u8 = 127;

/// Major opcode the server assigns to the XInput extension.
pub const XINPUT_MAJOR: u8 = 131;

/// XInput minor opcodes (1.x range, then XI2).
pub mod xinput {
    pub const GET_EXTENSION_VERSION: u8 = 1;
    pub const LIST_INPUT_DEVICES: u8 = 2;
    pub const OPEN_DEVICE: u8 = 3;
    pub const CLOSE_DEVICE: u8 = 4;
    pub const SELECT_EXTENSION_EVENT: u8 = 6;
    pub const GET_SELECTED_EXTENSION_EVENTS: u8 = 7;
    pub const GET_DEVICE_MOTION_EVENTS: u8 = 10;
    pub const GRAB_DEVICE: u8 = 13;
    pub const UNGRAB_DEVICE: u8 = 14;
    pub const GRAB_DEVICE_KEY: u8 = 15;
    pub const UNGRAB_DEVICE_KEY: u8 = 16;
    pub const GRAB_DEVICE_BUTTON: u8 = 17;
    pub const UNGRAB_DEVICE_BUTTON: u8 = 18;
    pub const ALLOW_DEVICE_EVENTS: u8 = 19;
    pub const SEND_EXTENSION_EVENT: u8 = 31;
    pub const XI_SELECT_EVENTS: u8 = 46;
    pub const XI_QUERY_VERSION: u8 = 47;
    pub const XI_QUERY_DEVICE: u8 = 48;
}

/// Human-readable opcode name for trace logging.
pub fn name(opcode: u8) -> &'static str {
    match opcode {
        CREATE_WINDOW => "CreateWindow",
        CHANGE_WINDOW_ATTRIBUTES => "ChangeWindowAttributes",
        GET_WINDOW_ATTRIBUTES => "GetWindowAttributes",
        DESTROY_WINDOW => "DestroyWindow",
        DESTROY_SUBWINDOWS => "DestroySubwindows",
        CHANGE_SAVE_SET => "ChangeSaveSet",
        REPARENT_WINDOW => "ReparentWindow",
        MAP_WINDOW => "MapWindow",
        MAP_SUBWINDOWS => "MapSubwindows",
        UNMAP_WINDOW => "UnmapWindow",
        UNMAP_SUBWINDOWS => "UnmapSubwindows",
        CONFIGURE_WINDOW => "ConfigureWindow",
        CIRCULATE_WINDOW => "CirculateWindow",
        GET_GEOMETRY => "GetGeometry",
        QUERY_TREE => "QueryTree",
        INTERN_ATOM => "InternAtom",
        GET_ATOM_NAME => "GetAtomName",
        CHANGE_PROPERTY => "ChangeProperty",
        DELETE_PROPERTY => "DeleteProperty",
        GET_PROPERTY => "GetProperty",
        LIST_PROPERTIES => "ListProperties",
        SET_SELECTION_OWNER => "SetSelectionOwner",
        GET_SELECTION_OWNER => "GetSelectionOwner",
        CONVERT_SELECTION => "ConvertSelection",
        SEND_EVENT => "SendEvent",
        GRAB_POINTER => "GrabPointer",
        UNGRAB_POINTER => "UngrabPointer",
        GRAB_BUTTON => "GrabButton",
        UNGRAB_BUTTON => "UngrabButton",
        CHANGE_ACTIVE_POINTER_GRAB => "ChangeActivePointerGrab",
        GRAB_KEYBOARD => "GrabKeyboard",
        UNGRAB_KEYBOARD => "UngrabKeyboard",
        GRAB_KEY => "GrabKey",
        UNGRAB_KEY => "UngrabKey",
        ALLOW_EVENTS => "AllowEvents",
        GRAB_SERVER => "GrabServer",
        UNGRAB_SERVER => "UngrabServer",
        QUERY_POINTER => "QueryPointer",
        GET_MOTION_EVENTS => "GetMotionEvents",
        TRANSLATE_COORDINATES => "TranslateCoordinates",
        WARP_POINTER => "WarpPointer",
        SET_INPUT_FOCUS => "SetInputFocus",
        GET_INPUT_FOCUS => "GetInputFocus",
        QUERY_KEYMAP => "QueryKeymap",
        OPEN_FONT => "OpenFont",
        CLOSE_FONT => "CloseFont",
        QUERY_FONT => "QueryFont",
        QUERY_TEXT_EXTENTS => "QueryTextExtents",
        LIST_FONTS => "ListFonts",
        LIST_FONTS_WITH_INFO => "ListFontsWithInfo",
        SET_FONT_PATH => "SetFontPath",
        GET_FONT_PATH => "GetFontPath",
        CREATE_PIXMAP => "CreatePixmap",
        FREE_PIXMAP => "FreePixmap",
        CREATE_GC => "CreateGC",
        CHANGE_GC => "ChangeGC",
        COPY_GC => "CopyGC",
        SET_DASHES => "SetDashes",
        SET_CLIP_RECTANGLES => "SetClipRectangles",
        FREE_GC => "FreeGC",
        CLEAR_AREA => "ClearArea",
        COPY_AREA => "CopyArea",
        COPY_PLANE => "CopyPlane",
        POLY_POINT => "PolyPoint",
        POLY_LINE => "PolyLine",
        POLY_SEGMENT => "PolySegment",
        POLY_RECTANGLE => "PolyRectangle",
        POLY_ARC => "PolyArc",
        FILL_POLY => "FillPoly",
        POLY_FILL_RECTANGLE => "PolyFillRectangle",
        POLY_FILL_ARC => "PolyFillArc",
        PUT_IMAGE => "PutImage",
        GET_IMAGE => "GetImage",
        POLY_TEXT8 => "PolyText8",
        POLY_TEXT16 => "PolyText16",
        IMAGE_TEXT8 => "ImageText8",
        IMAGE_TEXT16 => "ImageText16",
        CREATE_COLORMAP => "CreateColormap",
        FREE_COLORMAP => "FreeColormap",
        COPY_COLORMAP_AND_FREE => "CopyColormapAndFree",
        INSTALL_COLORMAP => "InstallColormap",
        UNINSTALL_COLORMAP => "UninstallColormap",
        LIST_INSTALLED_COLORMAPS => "ListInstalledColormaps",
        ALLOC_COLOR => "AllocColor",
        ALLOC_NAMED_COLOR => "AllocNamedColor",
        ALLOC_COLOR_CELLS => "AllocColorCells",
        ALLOC_COLOR_PLANES => "AllocColorPlanes",
        FREE_COLORS => "FreeColors",
        STORE_COLORS => "StoreColors",
        STORE_NAMED_COLOR => "StoreNamedColor",
        QUERY_COLORS => "QueryColors",
        LOOKUP_COLOR => "LookupColor",
        CREATE_CURSOR => "CreateCursor",
        CREATE_GLYPH_CURSOR => "CreateGlyphCursor",
        FREE_CURSOR => "FreeCursor",
        RECOLOR_CURSOR => "RecolorCursor",
        QUERY_BEST_SIZE => "QueryBestSize",
        QUERY_EXTENSION => "QueryExtension",
        LIST_EXTENSIONS => "ListExtensions",
        CHANGE_KEYBOARD_MAPPING => "ChangeKeyboardMapping",
        GET_KEYBOARD_MAPPING => "GetKeyboardMapping",
        CHANGE_KEYBOARD_CONTROL => "ChangeKeyboardControl",
        GET_KEYBOARD_CONTROL => "GetKeyboardControl",
        BELL => "Bell",
        CHANGE_POINTER_CONTROL => "ChangePointerControl",
        GET_POINTER_CONTROL => "GetPointerControl",
        SET_SCREEN_SAVER => "SetScreenSaver",
        GET_SCREEN_SAVER => "GetScreenSaver",
        CHANGE_HOSTS => "ChangeHosts",
        LIST_HOSTS => "ListHosts",
        SET_ACCESS_CONTROL => "SetAccessControl",
        SET_CLOSE_DOWN_MODE => "SetCloseDownMode",
        KILL_CLIENT => "KillClient",
        ROTATE_PROPERTIES => "RotateProperties",
        FORCE_SCREEN_SAVER => "ForceScreenSaver",
        SET_POINTER_MAPPING => "SetPointerMapping",
        GET_POINTER_MAPPING => "GetPointerMapping",
        SET_MODIFIER_MAPPING => "SetModifierMapping",
        GET_MODIFIER_MAPPING => "GetModifierMapping",
        NO_OPERATION => "NoOperation",
        XINPUT_MAJOR => "XInput",
        _ => "Unknown",
    }
}
