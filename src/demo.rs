//! Built-in pet store used by the `demo` command.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;

use swagdoc::{
    endpoint::Link,
    security::{OAuthFlow, OAuthFlows, SecurityDefinition, SecurityRequirement, SecurityScheme},
    v2::{self, Swagger},
    v3::{self, OpenAPI},
    Callback, CollectionFormat, CustomResponse, DocumentConfig, Endpoint, FieldDescriptor,
    ParamType, Parameter, Reflect, ResponseSpec, SwagResult, TypeDescriptor,
};

const OAUTH_AUTHORIZE: &str = "https://petstore.example.com/oauth/authorize";
const OAUTH_SCOPES: &[(&str, &str)] = &[("write:pets", "modify pets"), ("read:pets", "read pets")];

struct Category;

impl Reflect for Category {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.Category",
            vec![
                FieldDescriptor::of::<i64>("ID").tag(r#"json:"id" example:"1""#),
                FieldDescriptor::of::<String>("Name").tag(r#"json:"name" example:"Dogs""#),
                FieldDescriptor::of::<Option<Box<Category>>>("Parent").tag(r#"json:"parent,omitempty""#),
            ],
        )
    }
}

struct Audit;

impl Reflect for Audit {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.Audit",
            vec![
                FieldDescriptor::of::<DateTime<Utc>>("CreatedAt").tag(r#"json:"createdAt""#),
                FieldDescriptor::of::<DateTime<Utc>>("UpdatedAt").tag(r#"json:"updatedAt,omitempty""#),
            ],
        )
    }
}

struct Pet;

impl Reflect for Pet {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.Pet",
            vec![
                FieldDescriptor::embed::<Audit>(),
                FieldDescriptor::of::<i64>("ID").tag(r#"json:"id" example:"10""#),
                FieldDescriptor::of::<String>("Name")
                    .tag(r#"json:"name" example:"doggie" desc:"Pet name" minLength:"1" maxLength:"64""#),
                FieldDescriptor::of::<Category>("Category").tag(r#"json:"category""#),
                FieldDescriptor::of::<Vec<String>>("PhotoUrls").tag(r#"json:"photoUrls""#),
                FieldDescriptor::of::<Vec<Tag>>("Tags").tag(r#"json:"tags,omitempty""#),
                FieldDescriptor::of::<String>("Status")
                    .tag(r#"json:"status" enum:"available,pending,sold" default:"available""#),
                FieldDescriptor::of::<HashMap<String, String>>("Attributes").tag(r#"json:"attributes,omitempty""#),
                FieldDescriptor::of::<String>("InternalNote").tag(r#"json:"-""#),
            ],
        )
    }
}

struct Tag;

impl Reflect for Tag {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.Tag",
            vec![
                FieldDescriptor::of::<i64>("ID").tag(r#"json:"id""#),
                FieldDescriptor::of::<String>("Name").tag(r#"json:"name""#),
            ],
        )
    }
}

struct Order;

impl Reflect for Order {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.Order",
            vec![
                FieldDescriptor::of::<i64>("ID").tag(r#"json:"id""#),
                FieldDescriptor::of::<i64>("PetID").tag(r#"json:"petId""#),
                FieldDescriptor::of::<i32>("Quantity").tag(r#"json:"quantity" min:"1" max:"100""#),
                FieldDescriptor::of::<DateTime<Utc>>("ShipDate").tag(r#"json:"shipDate""#),
                FieldDescriptor::of::<bool>("Complete").tag(r#"json:"complete""#),
            ],
        )
    }
}

struct ApiError;

impl Reflect for ApiError {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::structure(
            "models.ApiError",
            vec![
                FieldDescriptor::of::<i32>("Code").tag(r#"json:"code" example:"400""#),
                FieldDescriptor::of::<String>("Message").tag(r#"json:"message""#),
            ],
        )
    }
}

pub fn config() -> DocumentConfig {
    DocumentConfig::new("Swagger Petstore", "1.0.0")
        .with_description("Sample pet store server.")
        .with_contact("API Support", Some("https://petstore.example.com/support"), None)
        .with_host("petstore.example.com")
        .with_base_path("/v2")
        .with_schemes(&["https"])
        .add_tag("pet", Some("Everything about your pets"))
        .add_tag("store", Some("Access to pet store orders"))
        .with_consumes(&["application/json"])
        .with_produces(&["application/json"])
}

fn endpoints() -> SwagResult<Vec<Endpoint>> {
    let pet_id = || Parameter::path("petId", ParamType::Integer).format("int64").description("ID of pet");

    let order_status = Callback::new("orderStatus", "{$request.body#/callbackUrl}")?.endpoint(
        Endpoint::post("/")
            .summary("Order status changed")
            .body::<Order>("updated order")
            .response(ResponseSpec::new(200, "acknowledged")),
    );

    Ok(vec![
        Endpoint::post("/pet")
            .summary("Add a new pet to the store")
            .operation_id("addPet")
            .tag("pet")
            .body::<Pet>("Pet object that needs to be added to the store")
            .success::<Pet>(200, "successful operation")
            .error::<ApiError>(405, "Invalid input")
            .security("petstore_auth", &["write:pets", "read:pets"]),
        Endpoint::get("/pet/findByStatus")
            .summary("Finds Pets by status")
            .operation_id("findPetsByStatus")
            .tag("pet")
            .parameter(
                Parameter::query("status", ParamType::String)
                    .array_of(ParamType::String, CollectionFormat::Multi)
                    .required(true)
                    .description("Status values that need to be considered for filter"),
            )
            .success::<Vec<Pet>>(200, "successful operation")
            .error::<ApiError>(400, "Invalid status value"),
        Endpoint::get("/pet/{petId}")
            .summary("Find pet by ID")
            .operation_id("getPetById")
            .tag("pet")
            .parameter(pet_id())
            .success::<CustomResponse<Pet>>(200, "successful operation")
            .error::<ApiError>(404, "Pet not found")
            .security("api_key", &[]),
        Endpoint::post("/pet/{petId}/uploadImage")
            .summary("uploads an image")
            .operation_id("uploadFile")
            .tag("pet")
            .consumes(&["multipart/form-data"])
            .parameter(pet_id())
            .parameter(Parameter::form("additionalMetadata", ParamType::String))
            .parameter(Parameter::file("file").required(true).description("file to upload"))
            .success_json(200, "successful operation", json!({"code": 200, "type": "ok", "message": "uploaded"})),
        Endpoint::delete("/pet/{petId}")
            .summary("Deletes a pet")
            .operation_id("deletePet")
            .tag("pet")
            .parameter(Parameter::header("api_key", ParamType::String))
            .parameter(pet_id())
            .error::<ApiError>(400, "Invalid ID supplied"),
        Endpoint::get("/store/inventory")
            .summary("Returns pet inventories by status")
            .operation_id("getInventory")
            .tag("store")
            .success::<HashMap<String, i32>>(200, "successful operation"),
        Endpoint::post("/store/order")
            .summary("Place an order for a pet")
            .operation_id("placeOrder")
            .tag("store")
            .body::<Order>("order placed for purchasing the pet")
            .response(
                ResponseSpec::new(200, "successful operation")
                    .model::<Order>()
                    .header("X-Rate-Limit", ParamType::Integer, Some("calls per hour allowed"))
                    .link(
                        "GetOrder",
                        Link::to_operation("getOrderById")?.parameter("orderId", "$response.body#/id")?,
                    ),
            )
            .error::<ApiError>(400, "Invalid Order")
            .callback(order_status),
        Endpoint::get("/store/order/{orderId}")
            .summary("Find purchase order by ID")
            .operation_id("getOrderById")
            .tag("store")
            .parameter(
                Parameter::path("orderId", ParamType::Integer)
                    .minimum(1.0, false)
                    .maximum(10.0, false),
            )
            .success::<Order>(200, "successful operation")
            .error::<ApiError>(404, "Order not found")
            .deprecated(),
    ])
}

pub fn swagger(config: DocumentConfig) -> SwagResult<Swagger> {
    let mut generator = v2::Generator::new(config);
    generator
        .add_security_definition("api_key", SecurityDefinition::api_key("api_key", "header")?)
        .add_security_definition(
            "petstore_auth",
            SecurityDefinition::oauth2("implicit", Some(OAUTH_AUTHORIZE), None, OAUTH_SCOPES)?,
        );
    generator.add_endpoints(endpoints()?);
    Ok(generator.generate())
}

pub fn openapi(config: DocumentConfig) -> SwagResult<OpenAPI> {
    let flows = OAuthFlows {
        implicit: Some(OAuthFlow::implicit(OAUTH_AUTHORIZE, OAUTH_SCOPES)?),
        ..Default::default()
    };
    let mut generator = v3::Generator::new(config);
    generator
        .add_security_scheme("api_key", SecurityScheme::api_key("api_key", "header")?)
        .add_security_scheme("petstore_auth", SecurityScheme::oauth2(flows)?)
        .add_security_scheme("bearer", SecurityScheme::bearer(Some("JWT")));
    let requirement: SecurityRequirement = [("bearer".to_string(), Vec::new())].into_iter().collect();
    generator.add_security_requirement(requirement)?;
    generator.add_endpoints(endpoints()?);
    Ok(generator.generate())
}
