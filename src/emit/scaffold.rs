//! Per-entity resource group: controller, service, guard and repository.
//!
//! These files are written once and then owned by the developer, so the
//! output favours readable, editable TypeScript over compactness.

use std::fmt::Write;

use super::{Emitter, Model, Names, Surface};

pub struct ControllerEmitter;

pub struct ServiceEmitter;

/// Existence guard plus a disabled ownership guard keyed on the owner field.
pub struct GuardEmitter;

pub struct RepositoryEmitter;

impl Emitter for RepositoryEmitter {
    fn surface(&self) -> Surface {
        Surface::Repository
    }

    fn render(&self, model: &Model<'_>) -> String {
        let n = Names::new(&model.entity.name);
        format!(
            "import \"reflect-metadata\";\n\
             import {{ Container, Token }} from \"typedi\";\n\
             import {{ {m}Entity }} from \"../../generated/model-interfaces\";\n\
             import {{ {m} }} from \"../../generated/models.sequelize\";\n\
             import {{ sequelize_model_class_crud_to_entity_object, IModelCrud }} from \"../../lib/utils/sequelize.utils\";\n\
             \n\
             export const {t} = new Token<IModelCrud<{m}Entity>>(\"{t}\");\n\
             \n\
             const {p}Repo: IModelCrud<{m}Entity> = sequelize_model_class_crud_to_entity_object<{m}Entity>({m});\n\
             \n\
             Container.set({t}, {p}Repo);\n",
            m = n.model,
            t = n.token,
            p = n.plural,
        )
    }
}

impl Emitter for GuardEmitter {
    fn surface(&self) -> Surface {
        Surface::Guard
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let n = Names::new(&entity.name);
        let pk = entity.primary_key();
        let mut out = String::new();

        let _ = writeln!(out, "import {{ NextFunction, Request, Response }} from \"express\";");
        let _ = writeln!(out, "import {{ Container }} from \"typedi\";");
        let _ = writeln!(out, "import {{ HttpStatusCodes }} from \"@app/shared\";");
        let _ = writeln!(out, "import {{ {}Entity }} from \"../../generated/model-interfaces\";", n.model);
        let _ = writeln!(out, "import {{ {} }} from \"./{}.repository\";", n.token, n.kebab_plural);
        out.push('\n');

        let _ = write!(
            out,
            "export async function {m}Exists(request: Request, response: Response, next: NextFunction) {{\n  \
             const {pk} = parseInt(request.params.id, 10);\n  \
             const {v} = await Container.get({t}).findOne({{ where: {{ {pk} }} }});\n  \
             if (!{v}) {{\n    \
             return response.status(HttpStatusCodes.NOT_FOUND).json({{\n      \
             message: `{m} does not exist by {pk}: ${{{pk}}}`,\n    \
             }});\n  \
             }}\n  \
             response.locals.{v} = {v};\n  \
             return next();\n\
             }}\n\n",
            m = n.model,
            v = n.var,
            t = n.token,
        );

        let _ = write!(
            out,
            "export async function AuthUserOwns{m}(request: Request, response: Response, next: NextFunction) {{\n  \
             /* Ownership check disabled until an authorization rule is chosen.\n  \
             const {v} = response.locals.{v} as {m}Entity;\n  \
             const isOwner = {v}.{owner} === request[\"auth\"].id;\n  \
             if (!isOwner) {{\n    \
             return response.status(HttpStatusCodes.FORBIDDEN).json({{\n      \
             message: `User is not owner of {m} by {pk}: ${{{v}.{pk}}}`,\n    \
             }});\n  \
             }}\n  \
             */\n  \
             return next();\n\
             }}\n",
            m = n.model,
            v = n.var,
            owner = model.owner.name(),
        );
        out
    }
}

impl Emitter for ServiceEmitter {
    fn surface(&self) -> Surface {
        Surface::Service
    }

    fn render(&self, model: &Model<'_>) -> String {
        let entity = model.entity;
        let n = Names::new(&entity.name);
        let (m, kp, repo) = (&n.model, &n.kebab_plural, format!("this.repositoryService.{}Repo", n.var));
        let pk = entity.primary_key();

        // Only scope writes to the caller when the entity really references the owner model.
        let owner_where = if model.owner.is_detected() {
            format!(" {}: auth_id,", model.owner.name())
        } else {
            String::new()
        };
        let owner_assign = if model.owner.is_detected() {
            format!("\n      {}: auth_id,", model.owner.name())
        } else {
            String::new()
        };

        let mut out = String::new();
        let _ = writeln!(out, "import \"reflect-metadata\";");
        let _ = writeln!(out, "import {{ Service }} from \"typedi\";");
        let _ = writeln!(out, "import {{ {m}Entity }} from \"../../generated/model-interfaces\";");
        let _ = writeln!(out, "import {{ RepositoryService }} from \"../../generated/repository.service\";");
        let _ = writeln!(out, "import {{ INTEGER_REGEX }} from \"../../generated/common.regex\";");
        let _ = writeln!(out, "import {{ parseQueryParams }} from \"../../lib/utils/query-parser.utils\";");
        let _ = writeln!(out, "import {{ Create{m}Dto }} from \"./dto/{kp}.create.dto\";");
        let _ = writeln!(out, "import {{ Update{m}Dto }} from \"./dto/{kp}.update.dto\";");
        let _ = writeln!(out, "import {{ Search{m}Dto }} from \"./dto/{kp}.search.dto\";");
        out.push('\n');

        let _ = write!(
            out,
            "export interface I{m}Service {{\n  \
             get{m}ById({pk}: number): Promise<{m}Entity>;\n  \
             get{m}BySearch(query: Search{m}Dto): Promise<{m}Entity[]>;\n  \
             create{m}(auth_id: number, dto: Create{m}Dto): Promise<{m}Entity>;\n  \
             update{m}(auth_id: number, {pk}: number, dto: Update{m}Dto): Promise<{{ rows: number }}>;\n  \
             patch{m}(auth_id: number, {pk}: number, dto: Update{m}Dto): Promise<{{ rows: number }}>;\n  \
             delete{m}(auth_id: number, {pk}: number): Promise<{{ rows: number }}>;\n\
             }}\n\n"
        );
        let _ = write!(
            out,
            "@Service()\n\
             export class {m}Service implements I{m}Service {{\n  \
             constructor(private repositoryService: RepositoryService) {{}}\n\n  \
             async get{m}ById({pk}: number): Promise<{m}Entity> {{\n    \
             return {repo}.findOne({{ where: {{ {pk} }} }});\n  \
             }}\n\n  \
             async get{m}BySearch(query: Search{m}Dto): Promise<{m}Entity[]> {{\n    \
             const limit = query[\"limit\"] && INTEGER_REGEX.test(query[\"limit\"])\n      \
             ? Math.min(100, parseInt(query[\"limit\"], 10))\n      \
             : 10;\n    \
             return {repo}.findAll({{ where: parseQueryParams(query), limit }});\n  \
             }}\n\n  \
             async create{m}(auth_id: number, dto: Create{m}Dto): Promise<{m}Entity> {{\n    \
             return {repo}.create({{\n      \
             ...dto,{owner_assign}\n    \
             }});\n  \
             }}\n\n  \
             async update{m}(auth_id: number, {pk}: number, dto: Update{m}Dto): Promise<{{ rows: number }}> {{\n    \
             const updates = await {repo}.update(dto, {{ where: {{ {pk},{owner_where} }} }});\n    \
             return {{ rows: updates.rows }};\n  \
             }}\n\n  \
             async patch{m}(auth_id: number, {pk}: number, dto: Update{m}Dto): Promise<{{ rows: number }}> {{\n    \
             const changes = Object.fromEntries(\n      \
             Object.entries(dto).filter(([, value]) => value !== null && value !== undefined),\n    \
             );\n    \
             const updates = await {repo}.update(changes, {{ where: {{ {pk},{owner_where} }} }});\n    \
             return {{ rows: updates.rows }};\n  \
             }}\n\n  \
             async delete{m}(auth_id: number, {pk}: number): Promise<{{ rows: number }}> {{\n    \
             const deletes = await {repo}.destroy({{ where: {{ {pk},{owner_where} }} }});\n    \
             return {{ rows: deletes.results }};\n  \
             }}\n\
             }}\n",
        );
        out
    }
}

impl Emitter for ControllerEmitter {
    fn surface(&self) -> Surface {
        Surface::Controller
    }

    fn render(&self, model: &Model<'_>) -> String {
        let n = Names::new(&model.entity.name);
        let (m, p, kp, v) = (&n.model, &n.plural, &n.kebab_plural, &n.var);

        let route = |verb: &str, path: &str, description: &str, guarded: bool, handler: &str| {
            let mut s = format!("  @{verb}(\"{path}\")\n");
            if guarded {
                s.push_str("  @UseBefore(JwtAuthorized)\n");
            }
            s.push_str(&format!("  @OpenAPI({{ description: \"{description}\" }})\n"));
            s.push_str(handler);
            s.push('\n');
            s
        };

        let mut out = String::new();
        let _ = writeln!(out, "import \"reflect-metadata\";");
        let _ = writeln!(
            out,
            "import {{ Body, Controller, Delete, Get, Param, Patch, Post, Put, QueryParams, UseBefore }} from \"routing-controllers\";"
        );
        let _ = writeln!(out, "import {{ OpenAPI }} from \"routing-controllers-openapi\";");
        let _ = writeln!(out, "import {{ Service }} from \"typedi\";");
        let _ = writeln!(out, "import {{ JwtUserData }} from \"@app/shared\";");
        let _ = writeln!(out, "import {{ JwtAuthorized }} from \"../../middlewares/jwt.middleware\";");
        let _ = writeln!(out, "import {{ JwtUser }} from \"../../decorators/jwt.decorator\";");
        let _ = writeln!(out, "import {{ {m}Service }} from \"./{kp}.service\";");
        let _ = writeln!(out, "import {{ {m}Exists, AuthUserOwns{m} }} from \"./{kp}.guard\";");
        let _ = writeln!(out, "import {{ Create{m}Dto }} from \"./dto/{kp}.create.dto\";");
        let _ = writeln!(out, "import {{ Update{m}Dto }} from \"./dto/{kp}.update.dto\";");
        let _ = writeln!(out, "import {{ Search{m}Dto }} from \"./dto/{kp}.search.dto\";");
        out.push('\n');

        let _ = writeln!(out, "@Controller(\"/{kp}\")");
        let _ = writeln!(out, "@Service()");
        let _ = writeln!(out, "export class {m}Controller {{");
        let _ = writeln!(out, "  constructor(private {v}Service: {m}Service) {{}}");
        out.push('\n');

        let svc = format!("this.{v}Service");
        out.push_str(&route(
            "Get",
            "/search",
            &format!("Search {p}"),
            false,
            &format!(
                "  search{p}(@QueryParams() query: Search{m}Dto) {{\n    return {svc}.get{m}BySearch(query);\n  }}\n"
            ),
        ));
        out.push_str(&route(
            "Get",
            "/:id",
            &format!("Get {m} by id"),
            false,
            &format!("  get{m}ById(@Param(\"id\") id: number) {{\n    return {svc}.get{m}ById(id);\n  }}\n"),
        ));
        out.push_str(&route(
            "Post",
            "",
            &format!("Create {m}"),
            true,
            &format!(
                "  create{m}(@JwtUser() user: JwtUserData, @Body({{ validate: true }}) dto: Create{m}Dto) {{\n    \
                 return {svc}.create{m}(user.id, dto);\n  }}\n"
            ),
        ));
        for (verb, action, description) in [
            ("Put", "update", "Overwrite"),
            ("Patch", "patch", "Update"),
        ] {
            out.push_str(&format!("  @{verb}(\"/:id\")\n  @UseBefore(JwtAuthorized, {m}Exists, AuthUserOwns{m})\n"));
            out.push_str(&format!("  @OpenAPI({{ description: \"{description} {m} by id\" }})\n"));
            let _ = writeln!(
                out,
                "  {action}{m}(@JwtUser() user: JwtUserData, @Param(\"id\") id: number, @Body({{ validate: true }}) dto: Update{m}Dto) {{\n    \
                 return {svc}.{action}{m}(user.id, id, dto);\n  }}\n"
            );
        }
        let _ = writeln!(
            out,
            "  @Delete(\"/:id\")\n  @UseBefore(JwtAuthorized, {m}Exists, AuthUserOwns{m})\n  \
             @OpenAPI({{ description: \"Delete {m} by id\" }})\n  \
             delete{m}(@JwtUser() user: JwtUserData, @Param(\"id\") id: number) {{\n    \
             return {svc}.delete{m}(user.id, id);\n  }}"
        );
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::Fixture;

    #[test]
    fn test_repository_token() {
        let fx = Fixture::sample();
        let text = fx.render(&RepositoryEmitter, "UserAuthProvider");
        assert!(text.contains(
            "export const USER_AUTH_PROVIDER_REPO_INJECT_TOKEN = new Token<IModelCrud<UserAuthProviderEntity>>(\"USER_AUTH_PROVIDER_REPO_INJECT_TOKEN\");\n"
        ));
        assert!(text.contains("Container.set(USER_AUTH_PROVIDER_REPO_INJECT_TOKEN, UserAuthProvidersRepo);\n"));
    }

    #[test]
    fn test_guard_uses_detected_owner() {
        let fx = Fixture::sample();
        let text = fx.render(&GuardEmitter, "UserAuthProvider");
        assert!(text.contains("export async function UserAuthProviderExists("));
        assert!(text.contains("  const isOwner = userAuthProvider.user_id === request[\"auth\"].id;\n"));
        assert!(text.contains("  /* Ownership check disabled"));
        assert!(text.contains("from \"./user-auth-providers.repository\";\n"));
    }

    #[test]
    fn test_guard_falls_back_to_default_owner() {
        let fx = Fixture::sample();
        let text = fx.render(&GuardEmitter, "Tag");
        assert!(text.contains("  const isOwner = tag.owner_id === request[\"auth\"].id;\n"));
    }

    #[test]
    fn test_service_scopes_writes_to_owner() {
        let fx = Fixture::sample();
        let text = fx.render(&ServiceEmitter, "UserTag");
        assert!(text.contains("export class UserTagService implements IUserTagService {\n"));
        assert!(text.contains("this.repositoryService.userTagRepo.destroy({ where: { id, user_id: auth_id, } });"));
        assert!(text.contains("      ...dto,\n      user_id: auth_id,\n"));

        let text = fx.render(&ServiceEmitter, "Tag");
        assert!(text.contains("this.repositoryService.tagRepo.destroy({ where: { id, } });"));
        assert!(!text.contains("auth_id,\n    });"));
    }

    #[test]
    fn test_service_implements_interface() {
        let fx = Fixture::sample();
        let text = fx.render(&ServiceEmitter, "Tag");
        assert!(text.contains(
            "export interface ITagService {\n  \
             getTagById(id: number): Promise<TagEntity>;\n  \
             getTagBySearch(query: SearchTagDto): Promise<TagEntity[]>;\n  \
             createTag(auth_id: number, dto: CreateTagDto): Promise<TagEntity>;\n  \
             updateTag(auth_id: number, id: number, dto: UpdateTagDto): Promise<{ rows: number }>;\n  \
             patchTag(auth_id: number, id: number, dto: UpdateTagDto): Promise<{ rows: number }>;\n  \
             deleteTag(auth_id: number, id: number): Promise<{ rows: number }>;\n\
             }\n\n@Service()\nexport class TagService implements ITagService {\n"
        ));
        assert!(text.contains("  async deleteTag(auth_id: number, id: number): Promise<{ rows: number }> {\n"));
    }

    #[test]
    fn test_controller_routes() {
        let fx = Fixture::sample();
        let text = fx.render(&ControllerEmitter, "UserTag");
        assert!(text.contains("@Controller(\"/user-tags\")\n"));
        assert!(text.contains("  searchUserTags(@QueryParams() query: SearchUserTagDto) {\n"));
        assert!(text.contains("  @Patch(\"/:id\")\n  @UseBefore(JwtAuthorized, UserTagExists, AuthUserOwnsUserTag)\n"));
        assert!(text.contains("    return this.userTagService.deleteUserTag(user.id, id);\n"));
        assert!(text.ends_with("  }\n}\n"));
    }
}
