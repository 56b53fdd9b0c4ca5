pub fn codeblock_fixture() -> &'static str {
    return r#"
Here's a quick preview of the selection first.

```python
print(bpy.context.selected_objects)
```

And here's the script that adds a cube above every selected object.

```python
import bpy

for obj in bpy.context.selected_objects:
    x, y, z = obj.location
    bpy.ops.mesh.primitive_cube_add(size=1.0, location=(x, y, z + 2.0))
```

Run it in Object Mode.
"#
    .trim();
}

pub fn fallback_fixture() -> &'static str {
    return r#"
Sure! Paste this into the Text Editor:

import bpy
bpy.ops.mesh.primitive_uv_sphere_add(radius=1.0)
"#
    .trim();
}

pub fn scene_fixture() -> &'static str {
    return r#"
{
  "mode": "OBJECT",
  "selected_objects": [
    {
      "name": "Cube",
      "type": "MESH",
      "dimensions": [2.0, 2.0, 2.0],
      "location": [0.0, 0.0, 0.0],
      "vertices": 8,
      "edges": 12,
      "polygons": 6
    }
  ],
  "active_object": { "name": "Cube", "type": "MESH" },
  "scene": { "name": "Scene", "objects_count": 3, "render_engine": "BLENDER_EEVEE" }
}
"#
    .trim();
}
